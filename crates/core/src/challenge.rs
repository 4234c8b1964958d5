//! TTL-backed challenge store for server-to-server challenge-response.
//!
//! Challenges are single-use nonces with an explicit expiry. The trait seam
//! admits an external cache implementation so any instance can consume a
//! challenge issued by another; the in-memory implementation sweeps expired
//! entries on every access.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use agentgate_types::StoreError;

/// Issues and consumes single-use challenge nonces
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Issue a fresh nonce for the agent, valid for `ttl`
    async fn issue(&self, agent_id: Uuid, ttl: Duration) -> Result<String, StoreError>;

    /// Consume a nonce. Returns true iff it was issued to this agent and
    /// has neither expired nor been consumed already.
    async fn consume(&self, agent_id: Uuid, nonce: &str) -> Result<bool, StoreError>;
}

struct ChallengeEntry {
    agent_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// Process-local TTL store
#[derive(Default)]
pub struct InMemoryChallengeStore {
    entries: RwLock<HashMap<String, ChallengeEntry>>,
}

impl InMemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) challenges
    pub async fn live(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }
}

#[async_trait]
impl ChallengeStore for InMemoryChallengeStore {
    async fn issue(&self, agent_id: Uuid, ttl: Duration) -> Result<String, StoreError> {
        let nonce = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            nonce.clone(),
            ChallengeEntry {
                agent_id,
                expires_at: now + ttl,
            },
        );
        Ok(nonce)
    }

    async fn consume(&self, agent_id: Uuid, nonce: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at > now);
        match entries.remove(nonce) {
            Some(entry) => Ok(entry.agent_id == agent_id),
            None => Ok(false),
        }
    }
}
