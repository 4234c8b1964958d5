//! Trust score aggregation.
//!
//! Aggregates the eight factor calculators into a single weighted score plus
//! a confidence metric, and appends every calculation to the immutable score
//! history. The weight table is the contract here; the maturity of any
//! single calculator is not.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use agentgate_types::{Agent, DriftReport, TrustFactors, TrustScore, TrustScoreStore};

use crate::capability_risk::CapabilityRiskAssessor;
use crate::factors::{
    ActionSuccessFactor, AgeFactor, ComplianceFactor, DriftFactor, FactorCalculator, FactorInput,
    FactorSample, FeedbackFactor, SecurityPostureFactor, UptimeFactor, VerificationStatusFactor,
};
use crate::{Result, TrustError};

/// Number of factors feeding the aggregate
pub const FACTOR_COUNT: usize = 8;

// Fixed factor weights, summing to 1.0.
const W_VERIFICATION: f64 = 0.25;
const W_UPTIME: f64 = 0.15;
const W_ACTION_SUCCESS: f64 = 0.15;
const W_SECURITY: f64 = 0.15;
const W_COMPLIANCE: f64 = 0.10;
const W_AGE: f64 = 0.10;
const W_DRIFT: f64 = 0.05;
const W_FEEDBACK: f64 = 0.05;

/// The eight calculators, each independently substitutable
pub struct FactorSet {
    pub verification: Box<dyn FactorCalculator>,
    pub uptime: Box<dyn FactorCalculator>,
    pub action_success: Box<dyn FactorCalculator>,
    pub security: Box<dyn FactorCalculator>,
    pub compliance: Box<dyn FactorCalculator>,
    pub age: Box<dyn FactorCalculator>,
    pub drift: Box<dyn FactorCalculator>,
    pub feedback: Box<dyn FactorCalculator>,
}

impl Default for FactorSet {
    fn default() -> Self {
        Self {
            verification: Box::new(VerificationStatusFactor),
            uptime: Box::new(UptimeFactor),
            action_success: Box::new(ActionSuccessFactor),
            security: Box::new(SecurityPostureFactor),
            compliance: Box::new(ComplianceFactor),
            age: Box::new(AgeFactor),
            drift: Box::new(DriftFactor),
            feedback: Box::new(FeedbackFactor),
        }
    }
}

/// Aggregates factor calculators into trust score records
pub struct TrustScoreEngine {
    assessor: CapabilityRiskAssessor,
    scores: Arc<dyn TrustScoreStore>,
    factors: FactorSet,
}

impl TrustScoreEngine {
    pub fn new(assessor: CapabilityRiskAssessor, scores: Arc<dyn TrustScoreStore>) -> Self {
        Self {
            assessor,
            scores,
            factors: FactorSet::default(),
        }
    }

    /// Replace the factor set, e.g. to wire in real telemetry sources
    pub fn with_factors(mut self, factors: FactorSet) -> Self {
        self.factors = factors;
        self
    }

    /// Calculate and persist a new trust score for the agent.
    ///
    /// A drift report from the current request, when present, feeds the
    /// drift factor. Each calculation appends a new immutable history
    /// record; the caller updates the agent's cached score from the result.
    pub async fn calculate(
        &self,
        agent: &Agent,
        drift: Option<&DriftReport>,
    ) -> Result<TrustScore> {
        let capability_risk = self.assessor.assess(agent.id().id()).await;
        let input = FactorInput {
            agent: agent.clone(),
            capability_risk,
            drift: drift.cloned(),
        };

        let verification = self.sample(&*self.factors.verification, &input).await;
        let uptime = self.sample(&*self.factors.uptime, &input).await;
        let action_success = self.sample(&*self.factors.action_success, &input).await;
        let security = self.sample(&*self.factors.security, &input).await;
        let compliance = self.sample(&*self.factors.compliance, &input).await;
        let age = self.sample(&*self.factors.age, &input).await;
        let drift_sample = self.sample(&*self.factors.drift, &input).await;
        let feedback = self.sample(&*self.factors.feedback, &input).await;

        let samples = [
            (verification, W_VERIFICATION),
            (uptime, W_UPTIME),
            (action_success, W_ACTION_SUCCESS),
            (security, W_SECURITY),
            (compliance, W_COMPLIANCE),
            (age, W_AGE),
            (drift_sample, W_DRIFT),
            (feedback, W_FEEDBACK),
        ];

        let score: f64 = samples
            .iter()
            .map(|(sample, weight)| sample.value * weight)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        let populated = samples.iter().filter(|(sample, _)| sample.populated).count();
        let confidence = populated as f64 / FACTOR_COUNT as f64;

        let factors = TrustFactors {
            verification_status: verification.value,
            uptime: uptime.value,
            action_success: action_success.value,
            security_posture: security.value,
            compliance: compliance.value,
            age: age.value,
            drift: drift_sample.value,
            feedback: feedback.value,
        };

        let record = TrustScore::new(agent.id().id(), score, factors, confidence)
            .map_err(TrustError::from)?;
        self.scores.append(&record).await?;

        info!(
            agent_id = %agent.id().id(),
            score = format!("{score:.3}"),
            confidence = format!("{confidence:.3}"),
            "trust score calculated"
        );
        Ok(record)
    }

    /// The most recent score for an agent
    pub async fn latest(&self, agent_id: Uuid) -> Result<Option<TrustScore>> {
        Ok(self.scores.latest(agent_id).await?)
    }

    /// The most recent scores for an agent, newest first
    pub async fn history(&self, agent_id: Uuid, limit: usize) -> Result<Vec<TrustScore>> {
        Ok(self.scores.history(agent_id, limit).await?)
    }

    /// Run one calculator, degrading to neutral on failure. Individual
    /// factor failures must not block scoring.
    async fn sample(&self, calculator: &dyn FactorCalculator, input: &FactorInput) -> FactorSample {
        match calculator.calculate(input).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!(factor = calculator.name(), error = %e, "factor failed, using neutral value");
                FactorSample::neutral()
            }
        }
    }
}
