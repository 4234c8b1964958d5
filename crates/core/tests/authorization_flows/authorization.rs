//! End-to-end authorization flows: signature checking, decision making and
//! event/audit recording through the engine facade.

use chrono::{Duration, Utc};
use serde_json::{json, Map};
use uuid::Uuid;

use std::sync::Arc;

use agentgate_core::{
    ActionRequest, AuthorizationEngine, ChallengeStore, EngineError, InMemoryAgentStore,
    InMemoryAuditLogStore, InMemoryCapabilityStore, InMemoryChallengeStore,
    InMemoryTrustScoreStore, InMemoryVerificationEventStore, InMemoryViolationStore,
    ResponseStatus, StaticDriftDetector,
};
use agentgate_crypto::{sign_payload, KeyPair};
use agentgate_types::{
    Agent, AgentStatus, StoreError, VerificationEvent, VerificationEventStore,
    VerificationOutcome, VerificationStatus,
};

use crate::support::{harness, register_agent, signed_request};

#[tokio::test]
async fn test_verified_agent_low_risk_action_is_approved() {
    let h = harness();
    let (agent, pair) = register_agent(&h, AgentStatus::Verified, 1.0).await;
    let request = signed_request(&agent, &pair, "read_file", "/srv/data/report.csv");

    let before = Utc::now();
    let response = h.engine.verify_action(request).await.unwrap();

    assert_eq!(response.status, ResponseStatus::Approved);
    assert_eq!(response.status_code(), 201);
    assert_eq!(response.approved_by.as_deref(), Some("agentgate-engine"));
    assert!(response.denial_reason.is_none());
    assert_eq!(response.trust_score, 1.0);

    let expires_at = response.expires_at.unwrap();
    assert!(expires_at >= before + Duration::hours(24));
    assert!(expires_at <= Utc::now() + Duration::hours(24));
}

#[tokio::test]
async fn test_approval_records_event_and_audit_entry() {
    let h = harness();
    let (agent, pair) = register_agent(&h, AgentStatus::Verified, 1.0).await;
    let request = signed_request(&agent, &pair, "read_file", "/srv/data/report.csv");

    let response = h.engine.verify_action(request).await.unwrap();

    let events = h.events.events().await;
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.id, response.id);
    assert_eq!(event.agent_id, agent.id().id());
    assert_eq!(event.organization_id, agent.organization_id());
    assert_eq!(event.status, VerificationStatus::Success);
    assert_eq!(event.result, Some(VerificationOutcome::Verified));
    assert!(event.signature.is_some());
    assert!(event.key_fingerprint.is_some());
    assert!(event.completed_at.is_some());

    let entries = h.audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].agent_id, agent.id().id());
    assert_eq!(entries[0].outcome, "approved");
}

#[tokio::test]
async fn test_low_trust_high_risk_action_is_denied() {
    let h = harness();
    let (agent, pair) = register_agent(&h, AgentStatus::Verified, 0.6).await;
    let request = signed_request(&agent, &pair, "delete_data", "customer-records");

    let response = h.engine.verify_action(request).await.unwrap();

    assert_eq!(response.status, ResponseStatus::Denied);
    assert_eq!(response.status_code(), 403);
    assert!(response.approved_by.is_none());
    assert!(response.expires_at.is_none());
    assert_eq!(
        response.denial_reason.as_deref(),
        Some("trust score 0.30 below required 0.70")
    );

    let events = h.events.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, VerificationStatus::Failed);
    assert_eq!(events[0].result, Some(VerificationOutcome::Denied));

    let entries = h.audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, "denied");
}

#[tokio::test]
async fn test_suspended_agent_is_denied_not_errored() {
    let h = harness();
    let (agent, pair) = register_agent(&h, AgentStatus::Suspended, 1.0).await;
    let request = signed_request(&agent, &pair, "read_file", "/srv/notes.txt");

    let response = h.engine.verify_action(request).await.unwrap();

    assert_eq!(response.status, ResponseStatus::Denied);
    assert!(response.denial_reason.unwrap().contains("not eligible"));
}

#[tokio::test]
async fn test_tampered_payload_is_rejected() {
    let h = harness();
    let (agent, pair) = register_agent(&h, AgentStatus::Verified, 1.0).await;
    let mut request = signed_request(&agent, &pair, "read_file", "/srv/data/report.csv");
    request.resource = "/etc/shadow".to_string();

    let err = h.engine.verify_action(request).await.unwrap_err();
    assert!(matches!(err, EngineError::Authentication(_)));
    assert_eq!(err.status_code(), 401);

    // The rejection is audited, but no verification event is produced.
    assert!(h.events.events().await.is_empty());
    let entries = h.audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, "authentication_failed");
}

#[tokio::test]
async fn test_public_key_mismatch_is_rejected() {
    let h = harness();
    let (agent, _pair) = register_agent(&h, AgentStatus::Verified, 1.0).await;
    let other = KeyPair::generate().unwrap();
    // Internally consistent signature, but the key is not the one on file.
    let request = signed_request(&agent, &other, "read_file", "/srv/notes.txt");

    let err = h.engine.verify_action(request).await.unwrap_err();
    assert!(matches!(err, EngineError::Authentication(_)));
    assert_eq!(err.status_code(), 401);
}

#[tokio::test]
async fn test_unknown_agent_is_not_found() {
    let h = harness();
    let pair = KeyPair::generate().unwrap();
    let ghost = Agent::new(
        "ghost-agent",
        Uuid::new_v4(),
        pair.public_key().to_bytes().to_vec(),
    )
    .unwrap();
    let request = signed_request(&ghost, &pair, "read_file", "/srv/notes.txt");

    let err = h.engine.verify_action(request).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_malformed_agent_id_fails_validation() {
    let h = harness();
    let (agent, pair) = register_agent(&h, AgentStatus::Verified, 1.0).await;
    let mut request = signed_request(&agent, &pair, "read_file", "/srv/notes.txt");
    request.agent_id = "not-a-uuid".to_string();

    let err = h.engine.verify_action(request).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_empty_action_type_fails_validation() {
    let h = harness();
    let (agent, pair) = register_agent(&h, AgentStatus::Verified, 1.0).await;
    let mut request = signed_request(&agent, &pair, "read_file", "/srv/notes.txt");
    request.action_type = String::new();

    let err = h.engine.verify_action(request).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn test_context_key_order_does_not_affect_verification() {
    let h = harness();
    let (agent, pair) = register_agent(&h, AgentStatus::Verified, 1.0).await;

    let mut context = Map::new();
    context.insert("region".to_string(), json!("eu-west-1"));
    context.insert("batch".to_string(), json!(7));
    let mut request = signed_request(&agent, &pair, "read_file", "/srv/data/report.csv");
    request.context = context;
    request.signature = sign_payload(&pair, &request.payload()).to_base64();

    // Same keys, reverse insertion order. Canonicalization must produce
    // identical bytes, so the signature still verifies.
    let mut reordered = Map::new();
    reordered.insert("batch".to_string(), json!(7));
    reordered.insert("region".to_string(), json!("eu-west-1"));
    request.context = reordered;

    let response = h.engine.verify_action(request).await.unwrap();
    assert_eq!(response.status, ResponseStatus::Approved);
}

#[tokio::test]
async fn test_runtime_drift_is_recorded_on_the_event() {
    let agents = InMemoryAgentStore::new();
    let events = InMemoryVerificationEventStore::new();
    let detector = StaticDriftDetector::new(
        vec!["files-server".to_string()],
        vec!["file-read".to_string()],
    );
    let engine = AuthorizationEngine::new(
        agents.clone(),
        InMemoryCapabilityStore::new(),
        InMemoryViolationStore::new(),
        InMemoryTrustScoreStore::new(),
        events.clone(),
        InMemoryAuditLogStore::new(),
    )
    .with_drift_detector(detector);

    let pair = KeyPair::generate().unwrap();
    let mut agent = Agent::new(
        "drifting-agent",
        Uuid::new_v4(),
        pair.public_key().to_bytes().to_vec(),
    )
    .unwrap();
    agent.update_status(AgentStatus::Verified);
    agent.update_trust_score(1.0);
    agents.insert(agent.clone()).await;

    // Observed usage is outside the canonical payload, so it can be set
    // after signing.
    let mut request = signed_request(&agent, &pair, "read_file", "/srv/notes.txt");
    request.observed_servers = vec!["files-server".to_string(), "unknown-server".to_string()];

    let response = engine.verify_action(request).await.unwrap();
    assert_eq!(response.status, ResponseStatus::Approved);

    let recorded = events.events().await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].drift_detected, Some(true));
    assert!(recorded[0]
        .server_drift
        .contains(&"unknown-server".to_string()));
}

struct FailingEventStore;

#[async_trait::async_trait]
impl VerificationEventStore for FailingEventStore {
    async fn append(&self, _event: &VerificationEvent) -> Result<(), StoreError> {
        Err(StoreError::Write("event log offline".into()))
    }
}

#[tokio::test]
async fn test_event_persistence_failure_does_not_block_the_verdict() {
    let agents = InMemoryAgentStore::new();
    let audit = InMemoryAuditLogStore::new();
    let engine = AuthorizationEngine::new(
        agents.clone(),
        InMemoryCapabilityStore::new(),
        InMemoryViolationStore::new(),
        InMemoryTrustScoreStore::new(),
        Arc::new(FailingEventStore),
        audit.clone(),
    );

    let pair = KeyPair::generate().unwrap();
    let mut agent = Agent::new(
        "resilient-agent",
        Uuid::new_v4(),
        pair.public_key().to_bytes().to_vec(),
    )
    .unwrap();
    agent.update_status(AgentStatus::Verified);
    agent.update_trust_score(1.0);
    agents.insert(agent.clone()).await;

    let request = signed_request(&agent, &pair, "read_file", "/srv/notes.txt");
    let response = engine.verify_action(request).await.unwrap();

    // The verdict survives the failed event append, and the audit entry
    // still lands.
    assert_eq!(response.status, ResponseStatus::Approved);
    assert_eq!(audit.entries().await.len(), 1);
}

#[tokio::test]
async fn test_challenge_nonce_is_required_and_single_use() {
    let agents = InMemoryAgentStore::new();
    let challenges = Arc::new(InMemoryChallengeStore::new());
    let engine = AuthorizationEngine::new(
        agents.clone(),
        InMemoryCapabilityStore::new(),
        InMemoryViolationStore::new(),
        InMemoryTrustScoreStore::new(),
        InMemoryVerificationEventStore::new(),
        InMemoryAuditLogStore::new(),
    )
    .with_challenge_store(challenges.clone());

    let pair = KeyPair::generate().unwrap();
    let mut agent = Agent::new(
        "challenged-agent",
        Uuid::new_v4(),
        pair.public_key().to_bytes().to_vec(),
    )
    .unwrap();
    agent.update_status(AgentStatus::Verified);
    agent.update_trust_score(1.0);
    agents.insert(agent.clone()).await;

    // Missing nonce is an authentication failure.
    let request = signed_request(&agent, &pair, "read_file", "/srv/notes.txt");
    let err = engine.verify_action(request.clone()).await.unwrap_err();
    assert!(matches!(err, EngineError::Authentication(_)));

    // An issued nonce admits the request once.
    let nonce = challenges
        .issue(agent.id().id(), Duration::minutes(5))
        .await
        .unwrap();
    let mut request = request;
    request.nonce = Some(nonce.clone());
    let response = engine.verify_action(request.clone()).await.unwrap();
    assert_eq!(response.status, ResponseStatus::Approved);

    // Replaying the same nonce is rejected.
    let err = engine.verify_action(request).await.unwrap_err();
    assert!(matches!(err, EngineError::Authentication(_)));
}

/// A plain ActionRequest deserializes with optional fields defaulted.
#[test]
fn test_request_deserializes_with_minimal_fields() {
    let raw = json!({
        "agent_id": Uuid::new_v4().to_string(),
        "action_type": "read_file",
        "resource": "/srv/notes.txt",
        "timestamp": 1_735_689_600,
        "signature": "c2ln",
        "public_key": "a2V5"
    });
    let request: ActionRequest = serde_json::from_value(raw).unwrap();
    assert!(request.context.is_empty());
    assert!(request.risk_level.is_none());
    assert!(request.observed_servers.is_empty());
    assert!(request.observed_capabilities.is_empty());
}
