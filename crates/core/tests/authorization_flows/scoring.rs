//! Capability risk assessment and trust score aggregation, exercised
//! against the in-memory stores.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use agentgate_core::{InMemoryCapabilityStore, InMemoryTrustScoreStore, InMemoryViolationStore};
use agentgate_trust::{CapabilityRiskAssessor, TrustScoreEngine, NEUTRAL_BASELINE};
use agentgate_types::{
    AgentCapability, AgentStatus, AgentStore, CapabilityStore, CapabilityType,
    CapabilityViolation, StoreError, ViolationSeverity,
};

use crate::support::{harness, register_agent};

const EPSILON: f64 = 1e-9;

#[tokio::test]
async fn test_risk_baseline_with_no_history() {
    let assessor = CapabilityRiskAssessor::new(
        InMemoryCapabilityStore::new(),
        InMemoryViolationStore::new(),
    );
    let assessment = assessor.assess(Uuid::new_v4()).await;

    assert!((assessment.score - NEUTRAL_BASELINE).abs() < EPSILON);
    assert_eq!(assessment.active_capabilities, 0);
    assert_eq!(assessment.recent_violations, 0);
    assert!(!assessment.degraded);
}

#[tokio::test]
async fn test_high_risk_capabilities_reduce_the_score() {
    let capabilities = InMemoryCapabilityStore::new();
    let agent_id = Uuid::new_v4();
    capabilities
        .grant(AgentCapability::grant(agent_id, CapabilityType::SystemAdmin))
        .await;
    capabilities
        .grant(AgentCapability::grant(agent_id, CapabilityType::ApiCall))
        .await;
    capabilities
        .grant(AgentCapability::grant(agent_id, CapabilityType::FileRead))
        .await;

    let assessor = CapabilityRiskAssessor::new(capabilities, InMemoryViolationStore::new());
    let assessment = assessor.assess(agent_id).await;

    // 0.7 - 0.20 (system-admin) - 0.05 (api-call) - 0.03 (low tier)
    assert!((assessment.score - 0.42).abs() < EPSILON);
    assert_eq!(assessment.active_capabilities, 3);
}

#[tokio::test]
async fn test_repeated_violations_compound_with_volume_penalty() {
    let violations = InMemoryViolationStore::new();
    let agent_id = Uuid::new_v4();
    for _ in 0..11 {
        violations
            .record(CapabilityViolation::new(
                agent_id,
                CapabilityType::FileDelete,
                ViolationSeverity::Low,
                true,
            ))
            .await;
    }

    let assessor = CapabilityRiskAssessor::new(InMemoryCapabilityStore::new(), violations);
    let assessment = assessor.assess(agent_id).await;

    // 0.7 - 11 x 0.02 (severity) - 0.20 (more than ten in the window)
    assert!((assessment.score - 0.28).abs() < EPSILON);
    assert_eq!(assessment.recent_violations, 11);
}

#[tokio::test]
async fn test_violations_outside_the_window_are_ignored() {
    let violations = InMemoryViolationStore::new();
    let agent_id = Uuid::new_v4();
    let mut stale = CapabilityViolation::new(
        agent_id,
        CapabilityType::UserImpersonate,
        ViolationSeverity::Critical,
        true,
    );
    stale.created_at = Utc::now() - Duration::days(31);
    violations.record(stale).await;

    let assessor = CapabilityRiskAssessor::new(InMemoryCapabilityStore::new(), violations);
    let assessment = assessor.assess(agent_id).await;

    assert!((assessment.score - NEUTRAL_BASELINE).abs() < EPSILON);
    assert_eq!(assessment.recent_violations, 0);
}

#[tokio::test]
async fn test_risk_score_floors_at_zero() {
    let violations = InMemoryViolationStore::new();
    let agent_id = Uuid::new_v4();
    for _ in 0..10 {
        violations
            .record(CapabilityViolation::new(
                agent_id,
                CapabilityType::DataExport,
                ViolationSeverity::Critical,
                true,
            ))
            .await;
    }

    let assessor = CapabilityRiskAssessor::new(InMemoryCapabilityStore::new(), violations);
    let assessment = assessor.assess(agent_id).await;

    assert_eq!(assessment.score, 0.0);
}

struct FailingCapabilityStore;

#[async_trait]
impl CapabilityStore for FailingCapabilityStore {
    async fn active_for_agent(&self, _agent_id: Uuid) -> Result<Vec<AgentCapability>, StoreError> {
        Err(StoreError::Unavailable("capability db offline".into()))
    }
}

#[tokio::test]
async fn test_store_failure_degrades_to_baseline() {
    let assessor = CapabilityRiskAssessor::new(
        Arc::new(FailingCapabilityStore),
        InMemoryViolationStore::new(),
    );
    let assessment = assessor.assess(Uuid::new_v4()).await;

    assert!((assessment.score - NEUTRAL_BASELINE).abs() < EPSILON);
    assert!(assessment.degraded);
}

#[tokio::test]
async fn test_trust_engine_weights_and_confidence() {
    let h = harness();
    let (agent, _pair) = register_agent(&h, AgentStatus::Verified, 0.5).await;

    let scores = InMemoryTrustScoreStore::new();
    let engine = TrustScoreEngine::new(
        CapabilityRiskAssessor::new(
            InMemoryCapabilityStore::new(),
            InMemoryViolationStore::new(),
        ),
        scores.clone(),
    );

    let record = engine.calculate(&agent, None).await.unwrap();

    // Verified status 1.0 x 0.25, security 1.0 x 0.15, age ~0 x 0.10,
    // everything else neutral 0.5.
    assert!((record.score - 0.65).abs() < 1e-6);
    // Verification, security and age are the only populated factors.
    assert!((record.confidence - 0.375).abs() < EPSILON);
    assert_eq!(record.factors.verification_status, 1.0);
    assert_eq!(record.factors.security_posture, 1.0);
    assert_eq!(scores.len().await, 1);
}

#[tokio::test]
async fn test_grants_and_violations_lower_the_security_factor() {
    let h = harness();
    let (agent, _pair) = register_agent(&h, AgentStatus::Verified, 0.5).await;
    let agent_id = agent.id().id();

    h.capabilities
        .grant(AgentCapability::grant(agent_id, CapabilityType::SystemAdmin))
        .await;
    h.violations
        .record(CapabilityViolation::new(
            agent_id,
            CapabilityType::SystemAdmin,
            ViolationSeverity::Medium,
            true,
        ))
        .await;

    let record = h.engine.calculate_trust_score(agent_id).await.unwrap();

    // Capability risk 0.7 - 0.20 - 0.05 = 0.45, normalized by the 0.7
    // baseline.
    assert!((record.factors.security_posture - 0.45 / 0.7).abs() < EPSILON);
    assert_eq!(h.scores.len().await, 1);
}

#[tokio::test]
async fn test_facade_recalculation_updates_cached_score() {
    let h = harness();
    let (agent, _pair) = register_agent(&h, AgentStatus::Verified, 0.5).await;
    let agent_id = agent.id().id();

    let record = h.engine.calculate_trust_score(agent_id).await.unwrap();

    let stored = h.agents.get(agent_id).await.unwrap().unwrap();
    assert!((stored.trust_score() - record.score).abs() < EPSILON);

    let history = h.engine.trust_score_history(agent_id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, record.id);

    let latest = h.engine.latest_trust_score(agent_id).await.unwrap().unwrap();
    assert_eq!(latest.id, record.id);
}
