//! In-memory store implementations.
//!
//! Backing stores for tests, the demo and single-instance deployments.
//! Every implementation is a thin `RwLock` over the obvious collection;
//! production deployments substitute their own implementations of the
//! traits in `agentgate_types::storage`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use agentgate_types::{
    Agent, AgentCapability, AgentStore, AuditEntry, AuditLogStore, CapabilityStore,
    CapabilityViolation, DriftDetector, DriftReport, StoreError, TrustScore, TrustScoreStore,
    VerificationEvent, VerificationEventStore, ViolationStore,
};

/// Agents keyed by UUID
#[derive(Default)]
pub struct InMemoryAgentStore {
    agents: RwLock<HashMap<Uuid, Agent>>,
}

impl InMemoryAgentStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn insert(&self, agent: Agent) {
        self.agents.write().await.insert(agent.id().id(), agent);
    }
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    async fn get(&self, agent_id: Uuid) -> Result<Option<Agent>, StoreError> {
        Ok(self.agents.read().await.get(&agent_id).cloned())
    }

    async fn update_trust_score(&self, agent_id: Uuid, score: f64) -> Result<(), StoreError> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(&agent_id)
            .ok_or_else(|| StoreError::Write(format!("unknown agent {agent_id}")))?;
        agent.update_trust_score(score);
        Ok(())
    }
}

/// Capability grants, append-only with in-place revocation
#[derive(Default)]
pub struct InMemoryCapabilityStore {
    capabilities: RwLock<Vec<AgentCapability>>,
}

impl InMemoryCapabilityStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn grant(&self, capability: AgentCapability) {
        self.capabilities.write().await.push(capability);
    }
}

#[async_trait]
impl CapabilityStore for InMemoryCapabilityStore {
    async fn active_for_agent(&self, agent_id: Uuid) -> Result<Vec<AgentCapability>, StoreError> {
        Ok(self
            .capabilities
            .read()
            .await
            .iter()
            .filter(|c| c.agent_id == agent_id && c.is_active())
            .cloned()
            .collect())
    }
}

/// Violations, append-only
#[derive(Default)]
pub struct InMemoryViolationStore {
    violations: RwLock<Vec<CapabilityViolation>>,
}

impl InMemoryViolationStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn record(&self, violation: CapabilityViolation) {
        self.violations.write().await.push(violation);
    }
}

#[async_trait]
impl ViolationStore for InMemoryViolationStore {
    async fn recent_for_agent(
        &self,
        agent_id: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CapabilityViolation>, StoreError> {
        let mut matching: Vec<CapabilityViolation> = self
            .violations
            .read()
            .await
            .iter()
            .filter(|v| v.agent_id == agent_id && v.created_at >= since)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn count_since(&self, agent_id: Uuid, since: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self
            .violations
            .read()
            .await
            .iter()
            .filter(|v| v.agent_id == agent_id && v.created_at >= since)
            .count() as u64)
    }
}

/// Append-only trust score history
#[derive(Default)]
pub struct InMemoryTrustScoreStore {
    scores: RwLock<Vec<TrustScore>>,
}

impl InMemoryTrustScoreStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of records held, across all agents
    pub async fn len(&self) -> usize {
        self.scores.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.scores.read().await.is_empty()
    }
}

#[async_trait]
impl TrustScoreStore for InMemoryTrustScoreStore {
    async fn append(&self, score: &TrustScore) -> Result<(), StoreError> {
        self.scores.write().await.push(score.clone());
        Ok(())
    }

    async fn latest(&self, agent_id: Uuid) -> Result<Option<TrustScore>, StoreError> {
        Ok(self
            .scores
            .read()
            .await
            .iter()
            .filter(|s| s.agent_id == agent_id)
            .max_by_key(|s| s.calculated_at)
            .cloned())
    }

    async fn history(
        &self,
        agent_id: Uuid,
        limit: usize,
    ) -> Result<Vec<TrustScore>, StoreError> {
        let mut matching: Vec<TrustScore> = self
            .scores
            .read()
            .await
            .iter()
            .filter(|s| s.agent_id == agent_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.calculated_at.cmp(&a.calculated_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

/// Append-only verification event log
#[derive(Default)]
pub struct InMemoryVerificationEventStore {
    events: RwLock<Vec<VerificationEvent>>,
}

impl InMemoryVerificationEventStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn events(&self) -> Vec<VerificationEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl VerificationEventStore for InMemoryVerificationEventStore {
    async fn append(&self, event: &VerificationEvent) -> Result<(), StoreError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}

/// Append-only audit log
#[derive(Default)]
pub struct InMemoryAuditLogStore {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLogStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn append(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }
}

/// Drift detector comparing observed usage against a fixed baseline
pub struct StaticDriftDetector {
    baseline_servers: Vec<String>,
    baseline_capabilities: Vec<String>,
}

impl StaticDriftDetector {
    pub fn new(baseline_servers: Vec<String>, baseline_capabilities: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            baseline_servers,
            baseline_capabilities,
        })
    }
}

#[async_trait]
impl DriftDetector for StaticDriftDetector {
    async fn detect_drift(
        &self,
        _agent_id: Uuid,
        current_servers: &[String],
        current_capabilities: &[String],
    ) -> Result<DriftReport, StoreError> {
        let server_drift = symmetric_difference(&self.baseline_servers, current_servers);
        let capability_drift =
            symmetric_difference(&self.baseline_capabilities, current_capabilities);
        Ok(DriftReport {
            drift_detected: !server_drift.is_empty() || !capability_drift.is_empty(),
            server_drift,
            capability_drift,
        })
    }
}

/// Entries present in exactly one of the two sets
fn symmetric_difference(baseline: &[String], observed: &[String]) -> Vec<String> {
    let mut drift: Vec<String> = observed
        .iter()
        .filter(|entry| !baseline.contains(entry))
        .cloned()
        .collect();
    drift.extend(
        baseline
            .iter()
            .filter(|entry| !observed.contains(entry))
            .cloned(),
    );
    drift
}
