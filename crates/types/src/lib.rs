//! Shared types for the agentgate engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub mod storage;

pub use storage::{
    AgentStore, AuditLogStore, CapabilityStore, DriftDetector, DriftReport, StoreError,
    TrustScoreStore, VerificationEventStore, ViolationStore,
};

// AgentId and related types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl AgentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Lifecycle status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Registered but not yet verified
    Pending,
    /// Identity verified by the organization
    Verified,
    /// Temporarily barred from operations
    Suspended,
    /// Permanently barred from operations
    Revoked,
}

impl Default for AgentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Verified => write!(f, "verified"),
            Self::Suspended => write!(f, "suspended"),
            Self::Revoked => write!(f, "revoked"),
        }
    }
}

/// An agent registered with the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// The unique identifier for this agent
    id: AgentId,
    /// The organization this agent belongs to
    organization_id: Uuid,
    /// The current status of this agent
    status: AgentStatus,
    /// The agent's registered Ed25519 public key (32 bytes)
    public_key: Vec<u8>,
    /// Cached latest trust score; the append-only history is the source of truth
    trust_score: f64,
    /// When this agent was last updated
    updated_at: DateTime<Utc>,
    /// Additional metadata for this agent
    #[serde(default)]
    metadata: serde_json::Value,
}

impl Agent {
    /// Create a new agent with the given name, organization and public key
    pub fn new(
        name: impl Into<String>,
        organization_id: Uuid,
        public_key: Vec<u8>,
    ) -> Result<Self> {
        if public_key.len() != 32 {
            return Err(AgentError::InvalidPublicKey(format!(
                "expected 32 bytes, got {}",
                public_key.len()
            )));
        }
        Ok(Self {
            id: AgentId::new(name),
            organization_id,
            status: AgentStatus::default(),
            public_key,
            trust_score: 0.5,
            updated_at: Utc::now(),
            metadata: serde_json::json!({}),
        })
    }

    /// Get the ID of this agent
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// Get the organization this agent belongs to
    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    /// Get the status of this agent
    pub fn status(&self) -> AgentStatus {
        self.status
    }

    /// Get the registered public key bytes
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Get the cached trust score
    pub fn trust_score(&self) -> f64 {
        self.trust_score
    }

    /// Get when this agent was last updated
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Get the metadata for this agent
    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    /// Update the status of this agent
    pub fn update_status(&mut self, status: AgentStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Update the cached trust score, clamping to [0, 1]
    pub fn update_trust_score(&mut self, score: f64) {
        self.trust_score = score.clamp(0.0, 1.0);
        self.updated_at = Utc::now();
    }

    /// Update the metadata for this agent
    pub fn update_metadata(&mut self, metadata: serde_json::Value) {
        self.metadata = metadata;
        self.updated_at = Utc::now();
    }

    /// Whether this agent is allowed to request action authorizations
    pub fn is_operational(&self) -> bool {
        matches!(self.status, AgentStatus::Verified | AgentStatus::Pending)
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Agent {} (Status: {}, Trust: {:.2})",
            self.id, self.status, self.trust_score
        )
    }
}

/// Risk classification shared by capabilities and actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Minimum trust score required to authorize an action in this tier
    pub fn required_threshold(&self) -> f64 {
        match self {
            Self::Low => 0.3,
            Self::Medium => 0.5,
            Self::High => 0.7,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// A grantable permission class, tagged with an inherent risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityType {
    FileRead,
    FileWrite,
    FileDelete,
    DbQuery,
    DbWrite,
    ApiCall,
    SystemAdmin,
    UserImpersonate,
    DataExport,
}

impl CapabilityType {
    /// The inherent risk tier of this capability
    pub fn risk_tier(&self) -> RiskTier {
        match self {
            Self::FileRead | Self::DbQuery => RiskTier::Low,
            Self::FileWrite | Self::DbWrite | Self::ApiCall => RiskTier::Medium,
            Self::FileDelete | Self::SystemAdmin | Self::UserImpersonate | Self::DataExport => {
                RiskTier::High
            }
        }
    }

    /// Fixed penalty this capability contributes to the capability-risk score
    pub fn risk_penalty(&self) -> f64 {
        match self {
            Self::FileRead | Self::DbQuery => 0.03,
            Self::ApiCall => 0.05,
            Self::FileWrite | Self::DbWrite => 0.08,
            Self::FileDelete | Self::SystemAdmin | Self::UserImpersonate | Self::DataExport => 0.20,
        }
    }
}

/// A capability granted to an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCapability {
    /// The agent this capability was granted to
    pub agent_id: Uuid,
    /// The granted capability class
    pub capability: CapabilityType,
    /// When the capability was granted
    pub granted_at: DateTime<Utc>,
    /// When the capability was revoked, if it was
    pub revoked_at: Option<DateTime<Utc>>,
}

impl AgentCapability {
    /// Grant a capability to an agent
    pub fn grant(agent_id: Uuid, capability: CapabilityType) -> Self {
        Self {
            agent_id,
            capability,
            granted_at: Utc::now(),
            revoked_at: None,
        }
    }

    /// Revoke this capability
    pub fn revoke(&mut self) {
        if self.revoked_at.is_none() {
            self.revoked_at = Some(Utc::now());
        }
    }

    /// Whether this capability is currently active (granted and not revoked)
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

/// Severity of a capability violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ViolationSeverity {
    /// Fixed penalty a qualifying violation of this severity contributes
    /// to the capability-risk score
    pub fn penalty(&self) -> f64 {
        match self {
            Self::Low => 0.02,
            Self::Medium => 0.05,
            Self::High => 0.10,
            Self::Critical => 0.15,
        }
    }
}

/// A recorded attempt by an agent to exceed its granted capabilities.
/// Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityViolation {
    /// Unique identifier for this violation
    pub id: Uuid,
    /// The agent that attempted the action
    pub agent_id: Uuid,
    /// The capability the agent attempted to exercise
    pub attempted: CapabilityType,
    /// How severe the attempt was
    pub severity: ViolationSeverity,
    /// Whether the attempt was blocked
    pub blocked: bool,
    /// When the violation was recorded
    pub created_at: DateTime<Utc>,
}

impl CapabilityViolation {
    /// Record a new violation
    pub fn new(
        agent_id: Uuid,
        attempted: CapabilityType,
        severity: ViolationSeverity,
        blocked: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            attempted,
            severity,
            blocked,
            created_at: Utc::now(),
        }
    }
}

/// The eight behavioral/security factor sub-scores, each in [0, 1]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustFactors {
    /// How thoroughly the agent's identity has been verified
    pub verification_status: f64,
    /// Observed availability
    pub uptime: f64,
    /// Fraction of recent actions that completed successfully
    pub action_success: f64,
    /// Capability posture and recent violations
    pub security_posture: f64,
    /// Policy compliance
    pub compliance: f64,
    /// Account age and score history depth
    pub age: f64,
    /// Runtime capability/server drift
    pub drift: f64,
    /// Aggregated user feedback
    pub feedback: f64,
}

impl Default for TrustFactors {
    fn default() -> Self {
        Self {
            verification_status: 0.5,
            uptime: 0.5,
            action_success: 0.5,
            security_posture: 0.5,
            compliance: 0.5,
            age: 0.5,
            drift: 0.5,
            feedback: 0.5,
        }
    }
}

/// One immutable trust-score calculation for an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustScore {
    /// Unique identifier for this calculation
    pub id: Uuid,
    /// The agent this score belongs to
    pub agent_id: Uuid,
    /// The aggregated score (0.0 to 1.0)
    pub score: f64,
    /// The individual factor sub-scores
    pub factors: TrustFactors,
    /// Fraction of expected data sources that were actually populated
    pub confidence: f64,
    /// When the score was calculated
    pub calculated_at: DateTime<Utc>,
}

impl TrustScore {
    /// Create a new trust score record
    pub fn new(agent_id: Uuid, score: f64, factors: TrustFactors, confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&score) {
            return Err(AgentError::InvalidTrustScore(
                "Score must be between 0.0 and 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AgentError::InvalidTrustScore(
                "Confidence must be between 0.0 and 1.0".into(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            agent_id,
            score,
            factors,
            confidence,
            calculated_at: Utc::now(),
        })
    }
}

/// Protocol classification of a verification event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationProtocol {
    /// Model Context Protocol traffic
    Mcp,
    /// Direct agent-to-agent traffic
    AgentToAgent,
}

impl Default for VerificationProtocol {
    fn default() -> Self {
        Self::AgentToAgent
    }
}

/// What aspect of the agent the event verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationType {
    Identity,
    Capability,
    Permission,
}

impl Default for VerificationType {
    fn default() -> Self {
        Self::Identity
    }
}

/// Processing status of a verification event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Success,
    Failed,
    Timeout,
}

/// Terminal outcome of a verification event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified,
    Denied,
}

/// Immutable audit record of an authorization decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationEvent {
    /// Unique identifier for this event
    pub id: Uuid,
    /// The organization the agent belongs to
    pub organization_id: Uuid,
    /// The agent that was verified
    pub agent_id: Uuid,
    /// Protocol classification
    pub protocol: VerificationProtocol,
    /// What was verified
    pub verification_type: VerificationType,
    /// Processing status
    pub status: VerificationStatus,
    /// Terminal outcome, once reached
    pub result: Option<VerificationOutcome>,
    /// Confidence in the outcome (0.0 to 1.0)
    pub confidence: f64,
    /// Trust score snapshot used for the decision
    pub trust_score: f64,
    /// Wall-clock processing time in milliseconds
    pub duration_ms: i64,
    /// Base64 signature material, when supplied
    pub signature: Option<String>,
    /// Base64 public key material, when supplied
    pub public_key: Option<String>,
    /// Hex SHA-256 fingerprint of the public key
    pub key_fingerprint: Option<String>,
    /// Challenge nonce, when one was issued
    pub nonce: Option<String>,
    /// Who initiated the verification
    pub initiator: Option<String>,
    /// Whether runtime drift was detected
    pub drift_detected: Option<bool>,
    /// MCP servers that drifted from the recorded baseline
    #[serde(default)]
    pub server_drift: Vec<String>,
    /// Capabilities that drifted from the recorded baseline
    #[serde(default)]
    pub capability_drift: Vec<String>,
    /// When the event was created
    pub created_at: DateTime<Utc>,
    /// When the event reached a terminal status
    pub completed_at: Option<DateTime<Utc>>,
}

impl VerificationEvent {
    /// Create a new pending event for an agent
    pub fn new(organization_id: Uuid, agent_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            agent_id,
            protocol: VerificationProtocol::default(),
            verification_type: VerificationType::default(),
            status: VerificationStatus::Pending,
            result: None,
            confidence: 0.0,
            trust_score: 0.0,
            duration_ms: 0,
            signature: None,
            public_key: None,
            key_fingerprint: None,
            nonce: None,
            initiator: None,
            drift_detected: None,
            server_drift: Vec::new(),
            capability_drift: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark the event as completed with the given status and outcome
    pub fn complete(&mut self, status: VerificationStatus, result: VerificationOutcome) {
        self.status = status;
        self.result = Some(result);
        let now = Utc::now();
        self.duration_ms = (now - self.created_at).num_milliseconds();
        self.completed_at = Some(now);
    }
}

/// One line in the append-only audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub agent_id: Uuid,
    /// The action type that was requested
    pub action: String,
    /// "approved", "denied", or an error class
    pub outcome: String,
    /// Free-form human-readable detail
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        agent_id: Uuid,
        action: impl Into<String>,
        outcome: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            action: action.into(),
            outcome: outcome.into(),
            detail: detail.into(),
            created_at: Utc::now(),
        }
    }
}

/// Errors that can occur while constructing or mutating domain types
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid agent ID: {0}")]
    InvalidId(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid trust score: {0}")]
    InvalidTrustScore(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<&str> for AgentError {
    fn from(s: &str) -> Self {
        AgentError::Internal(s.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
