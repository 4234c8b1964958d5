//! Collaborator seams consumed by the engine.
//!
//! The engine never talks to persistence directly; every lookup and append
//! goes through one of these traits so storage backends (and the drift
//! detector) remain independently replaceable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    Agent, AgentCapability, AuditEntry, CapabilityViolation, TrustScore, VerificationEvent,
};

/// Errors surfaced by storage collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Agent lookup and cached-score maintenance
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Look up an agent by its UUID
    async fn get(&self, agent_id: Uuid) -> Result<Option<Agent>, StoreError>;

    /// Update the agent's cached trust score (a read-optimization, never
    /// the source of truth)
    async fn update_trust_score(&self, agent_id: Uuid, score: f64) -> Result<(), StoreError>;
}

/// Active-capability lookup
#[async_trait]
pub trait CapabilityStore: Send + Sync {
    /// All currently active (granted, not revoked) capabilities of an agent
    async fn active_for_agent(&self, agent_id: Uuid) -> Result<Vec<AgentCapability>, StoreError>;
}

/// Violation lookup, paginated plus an exact aggregate
#[async_trait]
pub trait ViolationStore: Send + Sync {
    /// The most recent violations created at or after `since`, newest
    /// first, capped at `limit`
    async fn recent_for_agent(
        &self,
        agent_id: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CapabilityViolation>, StoreError>;

    /// Exact count of violations created at or after `since`
    async fn count_since(&self, agent_id: Uuid, since: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Append-only trust score history
#[async_trait]
pub trait TrustScoreStore: Send + Sync {
    /// Append a new calculation; existing records are never overwritten
    async fn append(&self, score: &TrustScore) -> Result<(), StoreError>;

    /// The most recent calculation for an agent
    async fn latest(&self, agent_id: Uuid) -> Result<Option<TrustScore>, StoreError>;

    /// The most recent calculations, newest first, capped at `limit`
    async fn history(&self, agent_id: Uuid, limit: usize)
        -> Result<Vec<TrustScore>, StoreError>;
}

/// Append-only verification event log
#[async_trait]
pub trait VerificationEventStore: Send + Sync {
    async fn append(&self, event: &VerificationEvent) -> Result<(), StoreError>;
}

/// Append-only audit log
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<(), StoreError>;
}

/// Result of comparing observed runtime usage against the recorded baseline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriftReport {
    /// Whether any drift was detected
    pub drift_detected: bool,
    /// MCP servers present in only one of baseline/observed
    pub server_drift: Vec<String>,
    /// Capabilities present in only one of baseline/observed
    pub capability_drift: Vec<String>,
}

/// External drift-detection collaborator
#[async_trait]
pub trait DriftDetector: Send + Sync {
    /// Compare the observed servers/capabilities against the agent's
    /// recorded baseline
    async fn detect_drift(
        &self,
        agent_id: Uuid,
        current_servers: &[String],
        current_capabilities: &[String],
    ) -> Result<DriftReport, StoreError>;
}
