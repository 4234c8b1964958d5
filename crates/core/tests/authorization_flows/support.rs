//! Shared fixtures: an engine wired to in-memory stores, plus helpers for
//! registering agents and producing correctly signed requests.

use std::sync::Arc;

use serde_json::Map;
use uuid::Uuid;

use agentgate_core::{
    ActionRequest, AuthorizationEngine, InMemoryAgentStore, InMemoryAuditLogStore,
    InMemoryCapabilityStore, InMemoryTrustScoreStore, InMemoryVerificationEventStore,
    InMemoryViolationStore,
};
use agentgate_crypto::{sign_payload, KeyPair};
use agentgate_types::{Agent, AgentStatus};

pub struct Harness {
    pub engine: AuthorizationEngine,
    pub agents: Arc<InMemoryAgentStore>,
    pub capabilities: Arc<InMemoryCapabilityStore>,
    pub violations: Arc<InMemoryViolationStore>,
    pub scores: Arc<InMemoryTrustScoreStore>,
    pub events: Arc<InMemoryVerificationEventStore>,
    pub audit: Arc<InMemoryAuditLogStore>,
}

pub fn harness() -> Harness {
    let agents = InMemoryAgentStore::new();
    let capabilities = InMemoryCapabilityStore::new();
    let violations = InMemoryViolationStore::new();
    let scores = InMemoryTrustScoreStore::new();
    let events = InMemoryVerificationEventStore::new();
    let audit = InMemoryAuditLogStore::new();

    let engine = AuthorizationEngine::new(
        agents.clone(),
        capabilities.clone(),
        violations.clone(),
        scores.clone(),
        events.clone(),
        audit.clone(),
    );

    Harness {
        engine,
        agents,
        capabilities,
        violations,
        scores,
        events,
        audit,
    }
}

/// Register an agent with a fresh key pair and the given status and cached
/// trust score
pub async fn register_agent(
    harness: &Harness,
    status: AgentStatus,
    trust_score: f64,
) -> (Agent, KeyPair) {
    let pair = KeyPair::generate().unwrap();
    let mut agent = Agent::new(
        "test-agent",
        Uuid::new_v4(),
        pair.public_key().to_bytes().to_vec(),
    )
    .unwrap();
    agent.update_status(status);
    agent.update_trust_score(trust_score);
    harness.agents.insert(agent.clone()).await;
    (agent, pair)
}

/// Build a request whose signature covers the canonical payload
pub fn signed_request(
    agent: &Agent,
    pair: &KeyPair,
    action_type: &str,
    resource: &str,
) -> ActionRequest {
    let mut request = ActionRequest {
        agent_id: agent.id().id().to_string(),
        action_type: action_type.to_string(),
        resource: resource.to_string(),
        context: Map::new(),
        timestamp: chrono::Utc::now().timestamp(),
        risk_level: None,
        signature: String::new(),
        public_key: pair.public_key().to_base64(),
        nonce: None,
        observed_servers: Vec::new(),
        observed_capabilities: Vec::new(),
    };
    request.signature = sign_payload(pair, &request.payload()).to_base64();
    request
}
