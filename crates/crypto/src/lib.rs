//! Cryptographic operations for the agentgate engine
//!
//! This crate provides the request-signing primitives shared by the engine
//! and its client SDKs:
//! - Ed25519 key generation and key material wrappers
//! - The canonical action-payload serialization all SDKs sign
//! - Signature verification over canonical payload bytes

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

mod canonical;
mod error;
mod signatures;
mod verifier;

pub use canonical::{canonical_json, ActionPayload};
pub use error::CryptoError;
pub use signatures::Signature;
pub use verifier::{sign_payload, SignatureVerifier};

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// A key pair consisting of a public and private key
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// The public key component
    pub public_key: PublicKey,
    /// The private key component
    pub private_key: PrivateKey,
}

/// A public key used for signature verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKey {
    /// The raw public key bytes
    pub key_bytes: Vec<u8>,
    /// The verifying key for signatures
    #[serde(skip)]
    pub verifying_key: Option<VerifyingKey>,
}

/// A private key used for signing
#[derive(Debug, Clone)]
pub struct PrivateKey {
    /// The raw private key bytes
    pub key_bytes: Vec<u8>,
    /// The signing key for signatures
    pub signing_key: SigningKey,
}

impl KeyPair {
    /// Create a new key pair from existing keys
    pub fn new(public_key: PublicKey, private_key: PrivateKey) -> Self {
        Self {
            public_key,
            private_key,
        }
    }

    /// Generate a new key pair
    pub fn generate() -> Result<Self> {
        let mut rng = OsRng;
        let mut secret_key_bytes = [0u8; 32];
        rng.fill_bytes(&mut secret_key_bytes);

        let signing_key = SigningKey::from_bytes(&secret_key_bytes);
        let verifying_key = VerifyingKey::from(&signing_key);

        Ok(Self::new(
            PublicKey::from_bytes(&verifying_key.to_bytes())?,
            PrivateKey::from_bytes(&secret_key_bytes)?,
        ))
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Get the private key
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Sign a message with the private key
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.private_key.signing_key.sign(message).into()
    }
}

impl PublicKey {
    /// Create a new public key from bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let verifying_key = VerifyingKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;

        Ok(Self {
            key_bytes: bytes.to_vec(),
            verifying_key: Some(verifying_key),
        })
    }

    /// Decode a public key from its base64 wire form
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            CryptoError::InvalidKeyFormat(format!("expected 32 bytes, got {}", v.len()))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Get the raw key bytes
    pub fn to_bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    /// Encode this key in its base64 wire form
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.key_bytes)
    }

    /// Hex SHA-256 fingerprint of the key bytes, recorded on audit events
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.key_bytes);
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.key_bytes == other.key_bytes
    }
}

impl Eq for PublicKey {}

impl PrivateKey {
    /// Create a new private key from bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let signing_key = SigningKey::from_bytes(bytes);

        Ok(Self {
            key_bytes: bytes.to_vec(),
            signing_key,
        })
    }

    /// Get the raw key bytes
    pub fn to_bytes(&self) -> &[u8] {
        &self.key_bytes
    }
}
