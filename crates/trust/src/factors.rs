//! The eight trust factor calculators.
//!
//! Each factor is an independently replaceable calculator behind the
//! [`FactorCalculator`] trait: real telemetry sources can substitute the
//! placeholder implementations without touching the aggregator. A sample
//! carries both the value and whether real data backed it, which feeds the
//! engine's confidence metric.

use async_trait::async_trait;

use agentgate_types::{Agent, AgentStatus, DriftReport};

use crate::capability_risk::{RiskAssessment, NEUTRAL_BASELINE};
use crate::Result;

/// Neutral value used when a factor has no data behind it
pub const NEUTRAL_FACTOR: f64 = 0.5;

/// Days after which the age factor saturates at 1.0
const AGE_SATURATION_DAYS: f64 = 180.0;

/// Everything the calculators may draw on for one calculation
#[derive(Debug, Clone)]
pub struct FactorInput {
    /// The agent being scored
    pub agent: Agent,
    /// Capability posture, already assessed (fail-open)
    pub capability_risk: RiskAssessment,
    /// Drift report computed for the current request, when one exists
    pub drift: Option<DriftReport>,
}

/// One factor's contribution
#[derive(Debug, Clone, Copy)]
pub struct FactorSample {
    /// The factor value, 0.0 to 1.0
    pub value: f64,
    /// Whether real data backed the value
    pub populated: bool,
}

impl FactorSample {
    pub fn populated(value: f64) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            populated: true,
        }
    }

    pub fn neutral() -> Self {
        Self {
            value: NEUTRAL_FACTOR,
            populated: false,
        }
    }
}

/// A single, replaceable trust factor source
#[async_trait]
pub trait FactorCalculator: Send + Sync {
    /// Stable name used in logs
    fn name(&self) -> &'static str;

    /// Compute this factor for the given input
    async fn calculate(&self, input: &FactorInput) -> Result<FactorSample>;
}

/// Verification status factor: how far along identity verification is
#[derive(Debug, Clone, Default)]
pub struct VerificationStatusFactor;

#[async_trait]
impl FactorCalculator for VerificationStatusFactor {
    fn name(&self) -> &'static str {
        "verification_status"
    }

    async fn calculate(&self, input: &FactorInput) -> Result<FactorSample> {
        let value = match input.agent.status() {
            AgentStatus::Verified => 1.0,
            AgentStatus::Pending => 0.4,
            AgentStatus::Suspended => 0.1,
            AgentStatus::Revoked => 0.0,
        };
        Ok(FactorSample::populated(value))
    }
}

/// Uptime factor. Placeholder until availability telemetry exists.
#[derive(Debug, Clone, Default)]
pub struct UptimeFactor;

#[async_trait]
impl FactorCalculator for UptimeFactor {
    fn name(&self) -> &'static str {
        "uptime"
    }

    async fn calculate(&self, _input: &FactorInput) -> Result<FactorSample> {
        Ok(FactorSample::neutral())
    }
}

/// Action success factor. Placeholder until per-action outcome telemetry
/// exists.
#[derive(Debug, Clone, Default)]
pub struct ActionSuccessFactor;

#[async_trait]
impl FactorCalculator for ActionSuccessFactor {
    fn name(&self) -> &'static str {
        "action_success"
    }

    async fn calculate(&self, _input: &FactorInput) -> Result<FactorSample> {
        Ok(FactorSample::neutral())
    }
}

/// Security posture factor, backed by the capability risk assessment
/// normalized from its [0, 0.7] range to [0, 1].
#[derive(Debug, Clone, Default)]
pub struct SecurityPostureFactor;

#[async_trait]
impl FactorCalculator for SecurityPostureFactor {
    fn name(&self) -> &'static str {
        "security_posture"
    }

    async fn calculate(&self, input: &FactorInput) -> Result<FactorSample> {
        let value = input.capability_risk.score / NEUTRAL_BASELINE;
        if input.capability_risk.degraded {
            // The assessment fell back to the neutral baseline; don't let
            // it inflate confidence.
            Ok(FactorSample {
                value: value.clamp(0.0, 1.0),
                populated: false,
            })
        } else {
            Ok(FactorSample::populated(value))
        }
    }
}

/// Compliance factor. Placeholder until policy-audit telemetry exists.
#[derive(Debug, Clone, Default)]
pub struct ComplianceFactor;

#[async_trait]
impl FactorCalculator for ComplianceFactor {
    fn name(&self) -> &'static str {
        "compliance"
    }

    async fn calculate(&self, _input: &FactorInput) -> Result<FactorSample> {
        Ok(FactorSample::neutral())
    }
}

/// Age factor: account age, saturating at 180 days
#[derive(Debug, Clone, Default)]
pub struct AgeFactor;

#[async_trait]
impl FactorCalculator for AgeFactor {
    fn name(&self) -> &'static str {
        "age"
    }

    async fn calculate(&self, input: &FactorInput) -> Result<FactorSample> {
        let age_days =
            (chrono::Utc::now() - input.agent.id().created_at()).num_seconds() as f64 / 86_400.0;
        Ok(FactorSample::populated(
            (age_days / AGE_SATURATION_DAYS).min(1.0),
        ))
    }
}

/// Drift factor: penalizes runtime capability/server drift observed on the
/// current request. Neutral when no drift report exists.
#[derive(Debug, Clone, Default)]
pub struct DriftFactor;

#[async_trait]
impl FactorCalculator for DriftFactor {
    fn name(&self) -> &'static str {
        "drift"
    }

    async fn calculate(&self, input: &FactorInput) -> Result<FactorSample> {
        match &input.drift {
            None => Ok(FactorSample::neutral()),
            Some(report) if !report.drift_detected => Ok(FactorSample::populated(1.0)),
            Some(report) => {
                let drifted = (report.server_drift.len() + report.capability_drift.len()) as f64;
                Ok(FactorSample::populated(1.0 - (drifted * 0.1).min(1.0)))
            }
        }
    }
}

/// User feedback factor. Placeholder until feedback aggregation exists.
#[derive(Debug, Clone, Default)]
pub struct FeedbackFactor;

#[async_trait]
impl FactorCalculator for FeedbackFactor {
    fn name(&self) -> &'static str {
        "feedback"
    }

    async fn calculate(&self, _input: &FactorInput) -> Result<FactorSample> {
        Ok(FactorSample::neutral())
    }
}
