use anyhow::Result;
use serde_json::Map;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use agentgate_core::{
    ActionRequest, AuthorizationEngine, InMemoryAgentStore, InMemoryAuditLogStore,
    InMemoryCapabilityStore, InMemoryTrustScoreStore, InMemoryVerificationEventStore,
    InMemoryViolationStore,
};
use agentgate_crypto::{sign_payload, KeyPair};
use agentgate_types::{Agent, AgentStatus};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .pretty()
        .init();

    info!("Starting agentgate demo...");

    // 1. Wire the engine to in-memory stores
    let agents = InMemoryAgentStore::new();
    let events = InMemoryVerificationEventStore::new();
    let audit = InMemoryAuditLogStore::new();
    let engine = AuthorizationEngine::new(
        agents.clone(),
        InMemoryCapabilityStore::new(),
        InMemoryViolationStore::new(),
        InMemoryTrustScoreStore::new(),
        events.clone(),
        audit.clone(),
    );

    // 2. Register a verified agent with a fresh Ed25519 key pair
    let pair = KeyPair::generate()?;
    let mut agent = Agent::new(
        "demo-agent",
        Uuid::new_v4(),
        pair.public_key().to_bytes().to_vec(),
    )?;
    agent.update_status(AgentStatus::Verified);
    agent.update_trust_score(0.9);
    agents.insert(agent.clone()).await;
    info!("Registered agent: {}", agent.id());

    // 3. Build and sign an action request
    let mut request = ActionRequest {
        agent_id: agent.id().id().to_string(),
        action_type: "read_file".to_string(),
        resource: "/srv/data/report.csv".to_string(),
        context: Map::new(),
        timestamp: chrono::Utc::now().timestamp(),
        risk_level: None,
        signature: String::new(),
        public_key: pair.public_key().to_base64(),
        nonce: None,
        observed_servers: Vec::new(),
        observed_capabilities: Vec::new(),
    };
    request.signature = sign_payload(&pair, &request.payload()).to_base64();
    info!("Signed request for action '{}'", request.action_type);

    // 4. Verify the action
    let response = engine.verify_action(request).await?;
    info!("Decision: {:?} (HTTP {})", response.status, response.status_code());
    if let Some(expires_at) = response.expires_at {
        info!("Approval valid until {}", expires_at);
    }
    if let Some(reason) = &response.denial_reason {
        info!("Denied: {}", reason);
    }

    // 5. A riskier action from the same agent
    let mut risky = ActionRequest {
        agent_id: agent.id().id().to_string(),
        action_type: "delete_data".to_string(),
        resource: "customer-records".to_string(),
        context: Map::new(),
        timestamp: chrono::Utc::now().timestamp(),
        risk_level: None,
        signature: String::new(),
        public_key: pair.public_key().to_base64(),
        nonce: None,
        observed_servers: Vec::new(),
        observed_capabilities: Vec::new(),
    };
    risky.signature = sign_payload(&pair, &risky.payload()).to_base64();

    let response = engine.verify_action(risky).await?;
    info!("Decision: {:?} (HTTP {})", response.status, response.status_code());
    if let Some(reason) = &response.denial_reason {
        info!("Denied: {}", reason);
    }

    // 6. Recalculate the trust score from first principles
    let score = engine.calculate_trust_score(agent.id().id()).await?;
    info!(
        "Recalculated trust score: {:.3} (confidence {:.3})",
        score.score, score.confidence
    );

    info!(
        "Recorded {} verification events and {} audit entries",
        events.events().await.len(),
        audit.entries().await.len()
    );

    info!("Demo completed successfully!");
    Ok(())
}
