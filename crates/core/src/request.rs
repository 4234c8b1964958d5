//! Wire-facing request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use agentgate_crypto::ActionPayload;

/// A signed action-authorization request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ActionRequest {
    /// UUID of the requesting agent, in string form
    #[validate(length(min = 1))]
    pub agent_id: String,
    /// The action being requested
    #[validate(length(min = 1, max = 128))]
    pub action_type: String,
    /// The resource the action targets
    #[validate(length(min = 1, max = 512))]
    pub resource: String,
    /// Free-form request context, part of the signed payload
    #[serde(default)]
    pub context: Map<String, Value>,
    /// Unix seconds at signing time
    pub timestamp: i64,
    /// Optional client-supplied risk hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    /// Base64 Ed25519 signature over the canonical payload
    #[validate(length(min = 1))]
    pub signature: String,
    /// Base64 Ed25519 public key of the requester
    #[validate(length(min = 1))]
    pub public_key: String,
    /// Challenge nonce, required when the engine enforces
    /// challenge-response. Not part of the signed payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// MCP servers in use at request time, for drift detection
    #[serde(default)]
    pub observed_servers: Vec<String>,
    /// Capabilities in use at request time, for drift detection
    #[serde(default)]
    pub observed_capabilities: Vec<String>,
}

impl ActionRequest {
    /// The signed fields of this request, in canonical form
    pub fn payload(&self) -> ActionPayload {
        ActionPayload {
            agent_id: self.agent_id.clone(),
            action_type: self.action_type.clone(),
            resource: self.resource.clone(),
            context: self.context.clone(),
            timestamp: self.timestamp,
            risk_level: self.risk_level.clone(),
        }
    }
}

/// Terminal status of an authorization request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Approved,
    Denied,
    Pending,
}

/// The engine's answer to one authorization request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    /// Identifier of the verification event recorded for this decision
    pub id: Uuid,
    pub status: ResponseStatus,
    /// Which component approved the request, on approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    /// When the approval stops being implicitly valid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Why the request was denied, on denial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<String>,
    /// Trust score snapshot the decision used
    pub trust_score: f64,
}

impl AuthorizationResponse {
    /// HTTP status code equivalent of this response. A denial is a valid
    /// negative decision, not an error.
    pub fn status_code(&self) -> u16 {
        match self.status {
            ResponseStatus::Approved => 201,
            ResponseStatus::Denied => 403,
            ResponseStatus::Pending => 202,
        }
    }
}
