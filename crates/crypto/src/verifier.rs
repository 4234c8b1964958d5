//! Signature verification over canonical payload bytes.

use crate::{ActionPayload, CryptoError, KeyPair, PublicKey, Result, Signature};

/// Validates Ed25519 signatures over the canonical serialization of an
/// action request. Pure and side-effect free; safe for unlimited parallel
/// execution.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Verify a base64 signature and public key against the payload.
    ///
    /// Fails with `InvalidKeyFormat` when the key is not 32 bytes, with
    /// `InvalidSignature` when the signature is malformed, and with
    /// `VerificationFailed` when the cryptographic check fails. The caller
    /// is responsible for matching the supplied key against the one on
    /// file for the agent.
    pub fn verify(
        &self,
        payload: &ActionPayload,
        signature_b64: &str,
        public_key_b64: &str,
    ) -> Result<()> {
        let public_key = PublicKey::from_base64(public_key_b64)?;
        let signature = Signature::from_base64(signature_b64)?;
        signature.verify(&payload.canonical_bytes(), &public_key)?;
        Ok(())
    }

    /// Convenience wrapper returning a boolean instead of the error chain,
    /// keeping malformed-input errors distinct from failed verification.
    pub fn is_valid(
        &self,
        payload: &ActionPayload,
        signature_b64: &str,
        public_key_b64: &str,
    ) -> Result<bool> {
        match self.verify(payload, signature_b64, public_key_b64) {
            Ok(()) => Ok(true),
            Err(CryptoError::VerificationFailed(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Sign a payload the way client SDKs do. Used by SDK-side code, tests and
/// the demo to produce valid requests.
pub fn sign_payload(pair: &KeyPair, payload: &ActionPayload) -> Signature {
    pair.sign(&payload.canonical_bytes())
}
