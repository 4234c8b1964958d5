//! Verdicts and audit records for the agentgate engine
//!
//! This crate implements the back half of the authorization pipeline:
//! - The pure approve/deny decision over signature validity, agent status
//!   and the risk-adjusted trust score
//! - The immutable verification event and audit-log records written for
//!   every decision

use thiserror::Error;

mod decision;
mod recorder;

pub use decision::{AuthorizationDecisionMaker, Decision, APPROVAL_VALIDITY_HOURS};
pub use recorder::{EventDetails, VerificationEventRecorder};

/// Errors that can occur during verdict handling
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Decision error: {0}")]
    DecisionError(String),

    #[error("Store error: {0}")]
    Store(#[from] agentgate_types::StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for verdict operations
pub type Result<T> = std::result::Result<T, VerifyError>;
