//! Action risk classification.
//!
//! Pure lookup from an action-type string to the risk multiplier applied to
//! the agent's trust score and the minimum threshold the adjusted score must
//! meet. Unknown action types land in the medium tier on both axes.

use agentgate_types::RiskTier;
use serde::{Deserialize, Serialize};

/// Risk profile of a requested action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionRisk {
    /// Multiplier applied to the agent's base trust score
    pub multiplier: f64,
    /// Risk tier driving the required threshold
    pub tier: RiskTier,
}

impl ActionRisk {
    /// Minimum trust score the risk-adjusted score must meet
    pub fn required_threshold(&self) -> f64 {
        self.tier.required_threshold()
    }
}

/// Classifies action types by keyword
#[derive(Debug, Clone, Default)]
pub struct ActionRiskClassifier;

impl ActionRiskClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Map an action type to its risk profile
    pub fn classify(&self, action_type: &str) -> ActionRisk {
        let action = action_type.to_ascii_lowercase();

        if contains_any(&action, &["delete", "remove", "drop", "destroy"]) {
            return ActionRisk {
                multiplier: 0.5,
                tier: RiskTier::High,
            };
        }
        if contains_any(&action, &["execute", "exec", "admin", "sudo"]) {
            return ActionRisk {
                multiplier: 0.3,
                tier: RiskTier::High,
            };
        }
        if contains_any(&action, &["read", "get", "list", "query", "fetch", "view"]) {
            return ActionRisk {
                multiplier: 1.0,
                tier: RiskTier::Low,
            };
        }

        // Writes and unknown action types share the medium defaults
        ActionRisk {
            multiplier: 0.8,
            tier: RiskTier::Medium,
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
