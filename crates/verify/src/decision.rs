//! The approve/deny decision.
//!
//! A pure function over signature validity, agent status and the
//! risk-adjusted trust score. Identical inputs always yield an identical
//! verdict; there is no retry state. Malformed requests and failed
//! signature checks are expected to short-circuit before this point and
//! surface as errors, not decisions, but the rule is total over its inputs
//! regardless.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use agentgate_trust::ActionRisk;
use agentgate_types::AgentStatus;

/// How long an approval stays implicitly valid for repeated use
pub const APPROVAL_VALIDITY_HOURS: i64 = 24;

/// Terminal verdict for one authorization request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    Approved {
        /// When the verdict stops being implicitly valid
        expires_at: DateTime<Utc>,
    },
    Denied {
        /// The trust score after the action's risk multiplier
        effective_score: f64,
        /// The threshold the effective score failed to meet
        required_threshold: f64,
        /// Human-readable denial reason
        reason: String,
    },
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approved { .. })
    }
}

/// Combines signature validity, agent status and risk-adjusted trust into
/// a verdict
#[derive(Debug, Clone, Default)]
pub struct AuthorizationDecisionMaker;

impl AuthorizationDecisionMaker {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether the request is approved.
    ///
    /// Approve iff the signature is valid, the agent is verified or
    /// pending, and `trust_score × multiplier ≥ required threshold`.
    /// Denials carry the effective score and the unmet threshold for
    /// auditability.
    pub fn decide(
        &self,
        signature_valid: bool,
        status: AgentStatus,
        trust_score: f64,
        risk: &ActionRisk,
    ) -> Decision {
        let effective_score = trust_score * risk.multiplier;
        let required_threshold = risk.required_threshold();

        if !signature_valid {
            return Decision::Denied {
                effective_score,
                required_threshold,
                reason: "signature verification failed".into(),
            };
        }

        if !matches!(status, AgentStatus::Verified | AgentStatus::Pending) {
            return Decision::Denied {
                effective_score,
                required_threshold,
                reason: format!("agent status {status} is not eligible for authorization"),
            };
        }

        if effective_score < required_threshold {
            return Decision::Denied {
                effective_score,
                required_threshold,
                reason: format!(
                    "trust score {effective_score:.2} below required {required_threshold:.2}"
                ),
            };
        }

        Decision::Approved {
            expires_at: Utc::now() + Duration::hours(APPROVAL_VALIDITY_HOURS),
        }
    }
}
