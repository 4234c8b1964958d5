//! Capability risk assessment.
//!
//! Produces a bounded risk score in [0.0, 0.7] from an agent's active
//! capabilities and its recent violation history. Store failures degrade to
//! empty input rather than erroring: this assessment feeds the authorization
//! path and must never block a decision on a secondary-data outage.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use agentgate_types::{CapabilityStore, ViolationStore};

/// Score for an agent with no active capabilities and no qualifying
/// violations
pub const NEUTRAL_BASELINE: f64 = 0.7;

/// Violations older than this contribute zero penalty (hard cutoff)
const VIOLATION_WINDOW_DAYS: i64 = 30;

/// Page cap for severity penalties; the volume penalty uses an exact count
const VIOLATION_PAGE_LIMIT: usize = 100;

/// Outcome of a capability risk assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// The bounded risk score, 0.0 to [`NEUTRAL_BASELINE`]
    pub score: f64,
    /// Active capabilities considered
    pub active_capabilities: usize,
    /// Qualifying violations counted for the volume penalty
    pub recent_violations: u64,
    /// Whether any store lookup failed and was treated as empty input
    pub degraded: bool,
}

/// Computes capability risk from the capability and violation stores
pub struct CapabilityRiskAssessor {
    capabilities: Arc<dyn CapabilityStore>,
    violations: Arc<dyn ViolationStore>,
}

impl CapabilityRiskAssessor {
    pub fn new(capabilities: Arc<dyn CapabilityStore>, violations: Arc<dyn ViolationStore>) -> Self {
        Self {
            capabilities,
            violations,
        }
    }

    /// Assess the agent's capability posture.
    ///
    /// Infallible: lookup failures are logged and the affected input is
    /// treated as empty, so the worst case is the neutral baseline.
    pub async fn assess(&self, agent_id: Uuid) -> RiskAssessment {
        let mut degraded = false;

        let capabilities = match self.capabilities.active_for_agent(agent_id).await {
            Ok(capabilities) => capabilities,
            Err(e) => {
                warn!(%agent_id, error = %e, "capability lookup failed, assessing without capabilities");
                degraded = true;
                Vec::new()
            }
        };

        let cutoff = Utc::now() - Duration::days(VIOLATION_WINDOW_DAYS);
        let violations = match self
            .violations
            .recent_for_agent(agent_id, cutoff, VIOLATION_PAGE_LIMIT)
            .await
        {
            Ok(violations) => violations,
            Err(e) => {
                warn!(%agent_id, error = %e, "violation lookup failed, assessing without violations");
                degraded = true;
                Vec::new()
            }
        };

        // The severity pass reads a bounded page; the volume step uses the
        // exact count so high-violation agents are never undercounted.
        let violation_count = match self.violations.count_since(agent_id, cutoff).await {
            Ok(count) => count,
            Err(e) => {
                warn!(%agent_id, error = %e, "violation count failed, falling back to page length");
                degraded = true;
                violations.len() as u64
            }
        };

        let mut score = NEUTRAL_BASELINE;

        for capability in capabilities.iter().filter(|c| c.is_active()) {
            score -= capability.capability.risk_penalty();
        }

        for violation in violations.iter().filter(|v| v.created_at >= cutoff) {
            score -= violation.severity.penalty();
        }

        score -= volume_penalty(violation_count);

        RiskAssessment {
            score: score.max(0.0),
            active_capabilities: capabilities.iter().filter(|c| c.is_active()).count(),
            recent_violations: violation_count,
            degraded,
        }
    }
}

/// Step function over the qualifying-violation count. Brackets are mutually
/// exclusive, never summed.
fn volume_penalty(count: u64) -> f64 {
    match count {
        0..=5 => 0.0,
        6..=10 => 0.10,
        _ => 0.20,
    }
}
