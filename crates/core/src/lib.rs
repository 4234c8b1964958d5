//! Authorization engine facade for agentgate.
//!
//! This crate wires signature verification, trust scoring, the decision
//! rule and audit recording into one request pipeline, and provides the
//! in-memory store implementations used by tests and the demo.

use thiserror::Error;

pub mod challenge;
pub mod engine;
pub mod repository;
pub mod request;

pub use challenge::{ChallengeStore, InMemoryChallengeStore};
pub use engine::AuthorizationEngine;
pub use repository::{
    InMemoryAgentStore, InMemoryAuditLogStore, InMemoryCapabilityStore, InMemoryTrustScoreStore,
    InMemoryVerificationEventStore, InMemoryViolationStore, StaticDriftDetector,
};
pub use request::{ActionRequest, AuthorizationResponse, ResponseStatus};

use agentgate_crypto::CryptoError;
use agentgate_trust::TrustError;
use agentgate_types::StoreError;

/// Errors that can occur in the authorization pipeline.
///
/// A denial is not an error: a valid request with insufficient trust
/// produces a normal [`AuthorizationResponse`] with status `denied`.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed or missing request fields; rejected before any crypto or
    /// scoring work
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bad signature or public key mismatch; distinct from a denial
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The requesting agent is unknown
    #[error("Agent not found: {0}")]
    NotFound(String),

    /// A store failure outside the fail-open paths
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Genuinely unexpected faults
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// HTTP status code equivalent of this error class
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Authentication(_) => 401,
            Self::NotFound(_) => 404,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<CryptoError> for EngineError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKeyFormat(_)
            | CryptoError::InvalidSignature(_)
            | CryptoError::VerificationFailed(_) => EngineError::Authentication(err.to_string()),
            other => EngineError::Internal(other.to_string()),
        }
    }
}

impl From<TrustError> for EngineError {
    fn from(err: TrustError) -> Self {
        EngineError::Internal(err.to_string())
    }
}

/// Result type for the authorization pipeline
pub type Result<T> = std::result::Result<T, EngineError>;
