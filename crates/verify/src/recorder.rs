//! Verification event recording.
//!
//! Builds the immutable audit record for every decision and appends it to
//! the event and audit stores. Persistence here is fail-open: a write
//! failure is logged and swallowed, never converting a completed verdict
//! into an error response.

use std::sync::Arc;

use tracing::{error, warn};
use uuid::Uuid;

use agentgate_crypto::PublicKey;
use agentgate_types::{
    AuditEntry, AuditLogStore, DriftDetector, DriftReport, VerificationEvent,
    VerificationEventStore, VerificationOutcome, VerificationProtocol, VerificationStatus,
    VerificationType,
};

use crate::Decision;

/// Inputs for one event record
#[derive(Debug, Clone)]
pub struct EventDetails {
    pub organization_id: Uuid,
    pub agent_id: Uuid,
    pub action_type: String,
    /// Trust score snapshot the decision used
    pub trust_score: f64,
    pub signature_b64: Option<String>,
    pub public_key_b64: Option<String>,
    pub nonce: Option<String>,
    pub initiator: Option<String>,
    /// MCP servers observed at request time, when the caller supplied them
    pub observed_servers: Vec<String>,
    /// Capabilities observed at request time, when the caller supplied them
    pub observed_capabilities: Vec<String>,
}

/// Builds and persists verification events and audit entries
pub struct VerificationEventRecorder {
    events: Arc<dyn VerificationEventStore>,
    audit: Arc<dyn AuditLogStore>,
    drift: Option<Arc<dyn DriftDetector>>,
}

impl VerificationEventRecorder {
    pub fn new(events: Arc<dyn VerificationEventStore>, audit: Arc<dyn AuditLogStore>) -> Self {
        Self {
            events,
            audit,
            drift: None,
        }
    }

    /// Attach the external drift-detection collaborator
    pub fn with_drift_detector(mut self, drift: Arc<dyn DriftDetector>) -> Self {
        self.drift = Some(drift);
        self
    }

    /// Build and persist the event for a completed decision, returning the
    /// event as recorded. Never fails: persistence problems are logged and
    /// the event is still returned to the caller.
    pub async fn record(&self, details: EventDetails, decision: &Decision) -> VerificationEvent {
        let mut event = VerificationEvent::new(details.organization_id, details.agent_id);
        event.protocol = classify_protocol(&details.action_type);
        event.verification_type = classify_type(&details.action_type);
        event.trust_score = details.trust_score;
        event.confidence = details.trust_score.clamp(0.0, 1.0);
        event.signature = details.signature_b64;
        event.key_fingerprint = details
            .public_key_b64
            .as_deref()
            .and_then(|encoded| PublicKey::from_base64(encoded).ok())
            .map(|key| key.fingerprint());
        event.public_key = details.public_key_b64;
        event.nonce = details.nonce;
        event.initiator = details.initiator;

        if let Some(report) = self
            .detect_drift(
                details.agent_id,
                &details.observed_servers,
                &details.observed_capabilities,
            )
            .await
        {
            event.drift_detected = Some(report.drift_detected);
            event.server_drift = report.server_drift;
            event.capability_drift = report.capability_drift;
        }

        match decision {
            Decision::Approved { .. } => {
                event.complete(VerificationStatus::Success, VerificationOutcome::Verified)
            }
            Decision::Denied { .. } => {
                event.complete(VerificationStatus::Failed, VerificationOutcome::Denied)
            }
        }

        if let Err(e) = self.events.append(&event).await {
            error!(event_id = %event.id, error = %e, "failed to persist verification event");
        }

        let (outcome, detail) = match decision {
            Decision::Approved { expires_at } => {
                ("approved".to_string(), format!("valid until {expires_at}"))
            }
            Decision::Denied { reason, .. } => ("denied".to_string(), reason.clone()),
        };
        let entry = AuditEntry::new(details.agent_id, details.action_type, outcome, detail);
        if let Err(e) = self.audit.append(&entry).await {
            error!(entry_id = %entry.id, error = %e, "failed to persist audit entry");
        }

        event
    }

    /// Run drift detection when runtime usage was supplied and a detector
    /// is wired in. Detector failures are logged and ignored.
    async fn detect_drift(
        &self,
        agent_id: Uuid,
        servers: &[String],
        capabilities: &[String],
    ) -> Option<DriftReport> {
        let detector = self.drift.as_ref()?;
        if servers.is_empty() && capabilities.is_empty() {
            return None;
        }
        match detector.detect_drift(agent_id, servers, capabilities).await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(%agent_id, error = %e, "drift detection failed, recording event without it");
                None
            }
        }
    }
}

/// MCP traffic is tagged by keyword; everything else is agent-to-agent
fn classify_protocol(action_type: &str) -> VerificationProtocol {
    let action = action_type.to_ascii_lowercase();
    if action.contains("mcp") || action.contains("anthropic") || action.contains("openai") {
        VerificationProtocol::Mcp
    } else {
        VerificationProtocol::AgentToAgent
    }
}

/// Identity by default; capability/permission when the action names them
fn classify_type(action_type: &str) -> VerificationType {
    let action = action_type.to_ascii_lowercase();
    if action.contains("capability") {
        VerificationType::Capability
    } else if action.contains("permission") {
        VerificationType::Permission
    } else {
        VerificationType::Identity
    }
}
