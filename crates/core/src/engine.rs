//! The authorization engine facade.
//!
//! One request is one independent, stateless unit of work:
//! validate → agent lookup → signature check → risk classification →
//! decision → audit recording. The signature check is the hard security
//! boundary and always synchronous; trust-score recalculation runs as a
//! detached background task that may race with in-flight requests.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use agentgate_crypto::{PublicKey, SignatureVerifier};
use agentgate_trust::{
    ActionRiskClassifier, CapabilityRiskAssessor, TrustScoreEngine,
};
use agentgate_types::{
    Agent, AgentStore, AuditEntry, AuditLogStore, CapabilityStore, DriftDetector, DriftReport,
    TrustScore, TrustScoreStore, VerificationEventStore, ViolationStore,
};
use agentgate_verify::{
    AuthorizationDecisionMaker, Decision, EventDetails, VerificationEventRecorder,
};
use validator::Validate;

use crate::challenge::ChallengeStore;
use crate::request::{ActionRequest, AuthorizationResponse, ResponseStatus};
use crate::{EngineError, Result};

/// Identity the engine stamps on approvals
const ENGINE_IDENTITY: &str = "agentgate-engine";

/// Wires the verifier, scoring, decision rule and recorder into one
/// request pipeline
pub struct AuthorizationEngine {
    agents: Arc<dyn AgentStore>,
    events: Arc<dyn VerificationEventStore>,
    audit: Arc<dyn AuditLogStore>,
    verifier: SignatureVerifier,
    classifier: ActionRiskClassifier,
    decision_maker: AuthorizationDecisionMaker,
    trust: Arc<TrustScoreEngine>,
    recorder: Arc<VerificationEventRecorder>,
    challenges: Option<Arc<dyn ChallengeStore>>,
}

impl AuthorizationEngine {
    pub fn new(
        agents: Arc<dyn AgentStore>,
        capabilities: Arc<dyn CapabilityStore>,
        violations: Arc<dyn ViolationStore>,
        scores: Arc<dyn TrustScoreStore>,
        events: Arc<dyn VerificationEventStore>,
        audit: Arc<dyn AuditLogStore>,
    ) -> Self {
        let assessor = CapabilityRiskAssessor::new(capabilities, violations);
        let trust = Arc::new(TrustScoreEngine::new(assessor, scores));
        let recorder = Arc::new(VerificationEventRecorder::new(
            events.clone(),
            audit.clone(),
        ));
        Self {
            agents,
            events,
            audit,
            verifier: SignatureVerifier::new(),
            classifier: ActionRiskClassifier::new(),
            decision_maker: AuthorizationDecisionMaker::new(),
            trust,
            recorder,
            challenges: None,
        }
    }

    /// Attach the external drift-detection collaborator
    pub fn with_drift_detector(mut self, detector: Arc<dyn DriftDetector>) -> Self {
        self.recorder = Arc::new(
            VerificationEventRecorder::new(self.events.clone(), self.audit.clone())
                .with_drift_detector(detector),
        );
        self
    }

    /// Enforce challenge-response: every request must carry a nonce
    /// previously issued to the agent through `store`
    pub fn with_challenge_store(mut self, store: Arc<dyn ChallengeStore>) -> Self {
        self.challenges = Some(store);
        self
    }

    /// Verify a signed action request and produce a verdict.
    ///
    /// Authentication failures (bad signature, key mismatch, malformed key
    /// material) are errors, distinct from a denial. A denial is a normal
    /// response with status `denied`.
    pub async fn verify_action(&self, request: ActionRequest) -> Result<AuthorizationResponse> {
        request
            .validate()
            .map_err(|e| EngineError::Validation(e.to_string()))?;
        let agent_id = Uuid::parse_str(&request.agent_id)
            .map_err(|_| EngineError::Validation(format!("invalid agent id {}", request.agent_id)))?;

        let agent = self
            .agents
            .get(agent_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(request.agent_id.clone()))?;

        if let Err(e) = self.authenticate(&agent, &request).await {
            self.audit_rejection(&agent, &request, &e).await;
            return Err(e);
        }

        let risk = self.classifier.classify(&request.action_type);
        let trust_score = agent.trust_score();
        let decision = self
            .decision_maker
            .decide(true, agent.status(), trust_score, &risk);

        let details = EventDetails {
            organization_id: agent.organization_id(),
            agent_id,
            action_type: request.action_type.clone(),
            trust_score,
            signature_b64: Some(request.signature.clone()),
            public_key_b64: Some(request.public_key.clone()),
            nonce: request.nonce.clone(),
            initiator: Some(request.agent_id.clone()),
            observed_servers: request.observed_servers.clone(),
            observed_capabilities: request.observed_capabilities.clone(),
        };
        let event = self.recorder.record(details, &decision).await;

        let drift = event.drift_detected.map(|detected| DriftReport {
            drift_detected: detected,
            server_drift: event.server_drift.clone(),
            capability_drift: event.capability_drift.clone(),
        });
        self.spawn_recalculation(agent.clone(), drift);

        let response = match decision {
            Decision::Approved { expires_at } => AuthorizationResponse {
                id: event.id,
                status: ResponseStatus::Approved,
                approved_by: Some(ENGINE_IDENTITY.to_string()),
                expires_at: Some(expires_at),
                denial_reason: None,
                trust_score,
            },
            Decision::Denied { reason, .. } => AuthorizationResponse {
                id: event.id,
                status: ResponseStatus::Denied,
                approved_by: None,
                expires_at: None,
                denial_reason: Some(reason),
                trust_score,
            },
        };
        info!(
            agent_id = %agent_id,
            action = %request.action_type,
            status = ?response.status,
            "authorization decided"
        );
        Ok(response)
    }

    /// Recalculate the agent's trust score, append the history record and
    /// refresh the cached score
    pub async fn calculate_trust_score(&self, agent_id: Uuid) -> Result<TrustScore> {
        let agent = self
            .agents
            .get(agent_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(agent_id.to_string()))?;
        let record = self.trust.calculate(&agent, None).await?;
        self.agents.update_trust_score(agent_id, record.score).await?;
        Ok(record)
    }

    /// The most recent trust score for an agent
    pub async fn latest_trust_score(&self, agent_id: Uuid) -> Result<Option<TrustScore>> {
        Ok(self.trust.latest(agent_id).await?)
    }

    /// The most recent trust scores for an agent, newest first
    pub async fn trust_score_history(
        &self,
        agent_id: Uuid,
        limit: usize,
    ) -> Result<Vec<TrustScore>> {
        Ok(self.trust.history(agent_id, limit).await?)
    }

    /// Check the supplied key against the one on file, then verify the
    /// signature over the canonical payload
    async fn authenticate(&self, agent: &Agent, request: &ActionRequest) -> Result<()> {
        if let Some(store) = &self.challenges {
            let nonce = request.nonce.as_deref().ok_or_else(|| {
                EngineError::Authentication("challenge nonce required".into())
            })?;
            if !store.consume(agent.id().id(), nonce).await? {
                return Err(EngineError::Authentication(
                    "challenge nonce invalid or expired".into(),
                ));
            }
        }

        let supplied = PublicKey::from_base64(&request.public_key)?;
        if supplied.to_bytes() != agent.public_key() {
            return Err(EngineError::Authentication(
                "public key does not match the key on file".into(),
            ));
        }

        let payload = request.payload();
        let valid = self
            .verifier
            .is_valid(&payload, &request.signature, &request.public_key)?;
        if !valid {
            return Err(EngineError::Authentication(
                "signature verification failed".into(),
            ));
        }
        Ok(())
    }

    /// Append an audit entry for an authentication rejection, fail-open
    async fn audit_rejection(&self, agent: &Agent, request: &ActionRequest, err: &EngineError) {
        let entry = AuditEntry::new(
            agent.id().id(),
            request.action_type.clone(),
            "authentication_failed",
            err.to_string(),
        );
        if let Err(e) = self.audit.append(&entry).await {
            error!(agent_id = %agent.id().id(), error = %e, "failed to audit rejection");
        }
    }

    /// Detached background recalculation. Allowed to race with in-flight
    /// requests; failures are logged, never surfaced to any caller.
    fn spawn_recalculation(&self, agent: Agent, drift: Option<DriftReport>) {
        let trust = Arc::clone(&self.trust);
        let agents = Arc::clone(&self.agents);
        tokio::spawn(async move {
            let agent_id = agent.id().id();
            match trust.calculate(&agent, drift.as_ref()).await {
                Ok(record) => {
                    if let Err(e) = agents.update_trust_score(agent_id, record.score).await {
                        warn!(%agent_id, error = %e, "failed to refresh cached trust score");
                    }
                }
                Err(e) => {
                    error!(%agent_id, error = %e, "background trust recalculation failed");
                }
            }
        });
    }
}
