use thiserror::Error;

use agentgate_types::StoreError;

/// Errors that can occur during trust operations
#[derive(Error, Debug)]
pub enum TrustError {
    #[error("Invalid trust score: {0}")]
    InvalidTrustScore(String),

    #[error("Factor calculation failed: {0}")]
    FactorError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<agentgate_types::AgentError> for TrustError {
    fn from(err: agentgate_types::AgentError) -> Self {
        TrustError::InvalidTrustScore(err.to_string())
    }
}

impl From<serde_json::Error> for TrustError {
    fn from(err: serde_json::Error) -> Self {
        TrustError::InternalError(err.to_string())
    }
}
