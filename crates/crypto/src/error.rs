use thiserror::Error;

/// Errors that can occur during cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Signature verification failed: {0}")]
    VerificationFailed(String),

    #[error("Canonicalization failed: {0}")]
    CanonicalizationError(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<ed25519_dalek::ed25519::Error> for CryptoError {
    fn from(err: ed25519_dalek::ed25519::Error) -> Self {
        CryptoError::InvalidSignature(err.to_string())
    }
}

impl From<serde_json::Error> for CryptoError {
    fn from(err: serde_json::Error) -> Self {
        CryptoError::CanonicalizationError(err.to_string())
    }
}
