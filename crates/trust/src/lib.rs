//! Trust scoring for the agentgate engine
//!
//! This crate implements the scoring side of the engine:
//! - Action risk classification (multiplier + required threshold per action)
//! - Capability risk assessment (baseline, penalties, violation windows)
//! - The eight-factor trust score aggregation and its pluggable calculators

mod action_risk;
mod capability_risk;
mod engine;
mod error;
mod factors;

pub use action_risk::{ActionRisk, ActionRiskClassifier};
pub use capability_risk::{CapabilityRiskAssessor, RiskAssessment, NEUTRAL_BASELINE};
pub use engine::{FactorSet, TrustScoreEngine, FACTOR_COUNT};
pub use error::TrustError;
pub use factors::{
    ActionSuccessFactor, AgeFactor, ComplianceFactor, DriftFactor, FactorCalculator, FactorInput,
    FactorSample, FeedbackFactor, SecurityPostureFactor, UptimeFactor, VerificationStatusFactor,
};

/// Result type for trust operations
pub type Result<T> = std::result::Result<T, TrustError>;
