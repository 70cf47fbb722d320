//! # Verification Orchestrator
//!
//! Drives one verification attempt end to end: parallel evidence fan-out,
//! hard-fail gating, face comparison, engine evaluation, and routing of
//! the outcome — including enqueueing REVIEW decisions and propagating
//! reviewer verdicts back to the session.
//!
//! ## Design
//!
//! Document analysis and liveness run concurrently; face comparison only
//! runs once both gates (liveness proof, document validity) have passed,
//! so a stolen-document presentation never reaches the most expensive
//! service. Adapter failures map to attempt outcomes, not errors: a
//! semantic "no face" is a FAIL, while exhausted retries or a timeout is
//! an ERRORED attempt that a new attempt within the budget may redo.

use std::sync::Arc;

use chrono::Utc;

use idv_audit::{AuditEvent, AuditEventType, AuditSink};
use idv_core::{ReviewId, ReviewerId, SessionId, VerificationConfig};
use idv_decision::{Decision, DecisionEngine, DecisionMetadata, HardFailCode};
use idv_evidence::{
    AdapterError, DocumentAnalysisRequest, DocumentAnalyzer, EvidenceBundle, FaceCompareRequest,
    FaceComparator, LivenessCheckRequest, LivenessProvider,
};
use idv_queue::{ReviewDecision, ReviewItem, ReviewOutcome, ReviewQueue};

use crate::attempt::{VerificationAttempt, VerificationRequest, VerificationStage};
use crate::error::WorkflowError;
use crate::retry::call_with_retry;
use crate::store::AttemptStore;

/// How the evidence pipeline ended, before outcome routing.
enum PipelineEnd {
    /// The engine (or a gate) produced a decision.
    Decided(Decision),
    /// The pipeline could not complete.
    Errored(String),
}

/// The orchestrator owns the attempt store and wires adapters, engine,
/// queue, and audit sink together. Cheap to share behind an `Arc`.
pub struct Orchestrator {
    config: VerificationConfig,
    engine: DecisionEngine,
    documents: Arc<dyn DocumentAnalyzer>,
    liveness: Arc<dyn LivenessProvider>,
    faces: Arc<dyn FaceComparator>,
    queue: Arc<ReviewQueue>,
    audit: Arc<dyn AuditSink>,
    store: AttemptStore,
}

impl Orchestrator {
    /// Wire up an orchestrator.
    pub fn new(
        config: VerificationConfig,
        documents: Arc<dyn DocumentAnalyzer>,
        liveness: Arc<dyn LivenessProvider>,
        faces: Arc<dyn FaceComparator>,
        queue: Arc<ReviewQueue>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            engine: DecisionEngine::new(config.clone()),
            config,
            documents,
            liveness,
            faces,
            queue,
            audit,
            store: AttemptStore::new(),
        }
    }

    /// The shared review queue.
    pub fn queue(&self) -> &Arc<ReviewQueue> {
        &self.queue
    }

    /// Latest attempt for a session.
    pub fn attempt(&self, session_id: &SessionId) -> Option<VerificationAttempt> {
        self.store.latest(session_id)
    }

    /// Full attempt history for a session, oldest first.
    pub fn attempt_history(&self, session_id: &SessionId) -> Vec<VerificationAttempt> {
        self.store.history(session_id)
    }

    // -----------------------------------------------------------------------
    // Verification pipeline
    // -----------------------------------------------------------------------

    /// Run one verification attempt for a session.
    ///
    /// Returns the attempt record in its resulting stage. Evidence
    /// failures end the attempt (FAILED or ERRORED) rather than erroring
    /// this call; the error path is reserved for workflow misuse (budget
    /// exhausted, concurrent attempt, unknown session).
    pub async fn verify(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationAttempt, WorkflowError> {
        let attempt = self
            .store
            .begin(&request.session_id, Utc::now(), self.config.max_attempts)?;
        self.audit.record(AuditEvent::system(
            AuditEventType::AttemptStarted,
            Utc::now(),
            Some(request.session_id.clone()),
            Some(serde_json::json!({ "attempt": attempt.number })),
        ));
        tracing::info!(
            session_id = %request.session_id,
            attempt = attempt.number,
            "verification attempt started"
        );

        let end = match tokio::time::timeout(
            self.config.overall_timeout,
            self.run_pipeline(&request),
        )
        .await
        {
            Ok(end) => end?,
            Err(_) => PipelineEnd::Errored("overall verification timeout elapsed".to_string()),
        };

        match end {
            PipelineEnd::Decided(decision) => {
                self.route_decision(&request.session_id, decision)?
            }
            PipelineEnd::Errored(reason) => self.mark_errored(&request.session_id, reason)?,
        }

        self.store
            .latest(&request.session_id)
            .ok_or_else(|| WorkflowError::UnknownSession {
                session_id: request.session_id.to_string(),
            })
    }

    async fn run_pipeline(
        &self,
        request: &VerificationRequest,
    ) -> Result<PipelineEnd, WorkflowError> {
        let session_id = &request.session_id;
        let doc_request = DocumentAnalysisRequest {
            document_image: request.document_image.clone(),
            back_image: request.back_image.clone(),
        };
        let live_request = LivenessCheckRequest {
            liveness_session: request.liveness_session.clone(),
        };

        let (doc_result, live_result) = tokio::join!(
            call_with_retry(&self.config.retry, "document_analysis", || {
                self.documents.analyze(&doc_request)
            }),
            call_with_retry(&self.config.retry, "face_liveness", || {
                self.liveness.liveness_result(&live_request)
            }),
        );
        self.audit_evidence(session_id, "document_analysis", doc_result.as_ref().err());
        self.audit_evidence(session_id, "face_liveness", live_result.as_ref().err());

        let (document, liveness) = match (doc_result, live_result) {
            (Ok(document), Ok(liveness)) => (document, liveness),
            (doc, live) => {
                let error = doc
                    .err()
                    .or(live.err())
                    .map_or_else(|| "evidence gathering failed".to_string(), |e| e.to_string());
                return Ok(PipelineEnd::Errored(error));
            }
        };

        self.store.update(session_id, |a| {
            a.document = Some(document.clone());
            a.liveness = Some(liveness.clone());
        })?;

        // Hard-fail gates: a failed liveness proof or an expired document
        // decides the attempt without paying for face comparison.
        let gate_metadata = DecisionMetadata {
            evaluated_at: Utc::now(),
            similarity: None,
            ocr_confidence: Some(document.ocr_confidence()),
            liveness_confidence: Some(liveness.confidence),
        };
        if !liveness.is_live {
            self.advance(session_id, VerificationStage::Deciding)?;
            return Ok(PipelineEnd::Decided(Decision::fail(
                HardFailCode::LivenessFailed,
                gate_metadata,
            )));
        }
        if document.is_expired {
            self.advance(session_id, VerificationStage::Deciding)?;
            return Ok(PipelineEnd::Decided(Decision::fail(
                HardFailCode::DocumentExpired,
                gate_metadata,
            )));
        }
        let Some(reference_image) = liveness.reference_image.clone() else {
            return Ok(PipelineEnd::Errored(
                "liveness result carries no reference image".to_string(),
            ));
        };

        self.advance(session_id, VerificationStage::FaceComparison)?;
        let compare_request = FaceCompareRequest {
            document_image: request.document_image.clone(),
            reference_image,
        };
        let compare_result = call_with_retry(&self.config.retry, "face_compare", || {
            self.faces.compare(&compare_request)
        })
        .await;
        self.audit_evidence(session_id, "face_compare", compare_result.as_ref().err());

        let similarity = match compare_result {
            Ok(similarity) => similarity,
            Err(AdapterError::NoFaceDetected { .. }) => {
                self.advance(session_id, VerificationStage::Deciding)?;
                return Ok(PipelineEnd::Decided(Decision::fail(
                    HardFailCode::NoFaceDetected,
                    gate_metadata,
                )));
            }
            Err(e) => return Ok(PipelineEnd::Errored(e.to_string())),
        };
        self.store
            .update(session_id, |a| a.similarity = Some(similarity.clone()))?;

        self.advance(session_id, VerificationStage::Deciding)?;
        let bundle = EvidenceBundle {
            document,
            liveness,
            similarity,
        };
        Ok(PipelineEnd::Decided(self.engine.evaluate(&bundle, Utc::now())))
    }

    fn route_decision(
        &self,
        session_id: &SessionId,
        decision: Decision,
    ) -> Result<(), WorkflowError> {
        let now = Utc::now();
        self.store
            .update(session_id, |a| a.decision = Some(decision.clone()))?;
        // Every decision is audited here, whether a gate produced it or
        // the engine did.
        self.audit.record(AuditEvent::system(
            AuditEventType::DecisionEvaluated,
            now,
            Some(session_id.clone()),
            Some(serde_json::json!({
                "outcome": decision.outcome,
                "hard_fail": decision.hard_fail,
                "reasons": decision
                    .review_reasons
                    .iter()
                    .map(|r| r.code)
                    .collect::<Vec<_>>(),
            })),
        ));

        if decision.is_review() {
            let priority = decision
                .priority
                .unwrap_or(idv_decision::ReviewPriority::Normal);
            let item = self.queue.enqueue(
                session_id.clone(),
                priority,
                decision.review_reasons.clone(),
                now,
                now + self.config.sla_window,
            )?;
            self.store
                .update(session_id, |a| a.review_id = Some(item.review_id))?;
            self.advance(session_id, VerificationStage::AwaitingReview)?;
            self.audit.record(
                AuditEvent::system(
                    AuditEventType::ReviewEnqueued,
                    now,
                    Some(session_id.clone()),
                    Some(serde_json::json!({ "priority": priority })),
                )
                .with_review(item.review_id),
            );
            return Ok(());
        }

        let stage = if decision.is_pass() {
            VerificationStage::Passed
        } else {
            VerificationStage::Failed
        };
        self.advance(session_id, stage)?;
        self.audit.record(AuditEvent::system(
            AuditEventType::AttemptCompleted,
            now,
            Some(session_id.clone()),
            Some(serde_json::json!({
                "stage": stage,
                "hard_fail": decision.hard_fail,
            })),
        ));
        Ok(())
    }

    fn mark_errored(&self, session_id: &SessionId, reason: String) -> Result<(), WorkflowError> {
        tracing::error!(session_id = %session_id, reason, "verification attempt errored");
        self.store.update(session_id, |a| {
            a.error = Some(reason.clone());
        })?;
        self.advance(session_id, VerificationStage::Errored)?;
        self.audit.record(
            AuditEvent::system(
                AuditEventType::AttemptCompleted,
                Utc::now(),
                Some(session_id.clone()),
                Some(serde_json::json!({ "stage": VerificationStage::Errored, "error": reason })),
            )
            .failed(),
        );
        Ok(())
    }

    fn advance(
        &self,
        session_id: &SessionId,
        to: VerificationStage,
    ) -> Result<(), WorkflowError> {
        let now = Utc::now();
        self.store
            .update(session_id, |a| a.advance(to, now))?
            .map_err(WorkflowError::from)
    }

    fn audit_evidence(
        &self,
        session_id: &SessionId,
        service: &'static str,
        error: Option<&AdapterError>,
    ) {
        let event = match error {
            None => AuditEvent::system(
                AuditEventType::EvidenceReceived,
                Utc::now(),
                Some(session_id.clone()),
                Some(serde_json::json!({ "service": service })),
            ),
            Some(e) => AuditEvent::system(
                AuditEventType::EvidenceFailed,
                Utc::now(),
                Some(session_id.clone()),
                Some(serde_json::json!({ "service": service, "error": e.to_string() })),
            )
            .failed(),
        };
        self.audit.record(event);
    }

    // -----------------------------------------------------------------------
    // Review propagation
    // -----------------------------------------------------------------------

    /// Claim a review item on behalf of a reviewer.
    pub fn claim_review(
        &self,
        review_id: ReviewId,
        reviewer: &ReviewerId,
    ) -> Result<ReviewItem, WorkflowError> {
        let item = self.queue.claim(review_id, reviewer, Utc::now())?;
        self.audit.record(AuditEvent::reviewer(
            AuditEventType::ReviewClaimed,
            Utc::now(),
            item.session_id.clone(),
            review_id,
            reviewer.clone(),
            None,
        ));
        Ok(item)
    }

    /// Record a reviewer's verdict and propagate it to the session.
    ///
    /// The queue item is decided exactly once; the session's awaiting
    /// attempt then moves to PASSED or FAILED.
    pub fn decide_review(
        &self,
        review_id: ReviewId,
        reviewer: &ReviewerId,
        outcome: ReviewOutcome,
        notes: Option<String>,
    ) -> Result<VerificationAttempt, WorkflowError> {
        let decision = self
            .queue
            .decide(review_id, reviewer, outcome, notes, Utc::now())?;
        self.audit.record(AuditEvent::reviewer(
            AuditEventType::ReviewDecided,
            decision.decided_at,
            decision.session_id.clone(),
            review_id,
            reviewer.clone(),
            Some(serde_json::json!({ "outcome": outcome })),
        ));
        self.complete_review(&decision)
    }

    /// Apply a recorded review verdict to the session's awaiting attempt.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::NotAwaitingReview`] if the session's latest
    /// attempt is not waiting on this review item.
    pub fn complete_review(
        &self,
        decision: &ReviewDecision,
    ) -> Result<VerificationAttempt, WorkflowError> {
        let session_id = &decision.session_id;
        let latest = self
            .store
            .latest(session_id)
            .ok_or_else(|| WorkflowError::UnknownSession {
                session_id: session_id.to_string(),
            })?;
        if latest.stage != VerificationStage::AwaitingReview
            || latest.review_id != Some(decision.review_id)
        {
            return Err(WorkflowError::NotAwaitingReview {
                session_id: session_id.to_string(),
                stage: latest.stage.to_string(),
            });
        }

        let stage = match decision.outcome {
            ReviewOutcome::Approved => VerificationStage::Passed,
            ReviewOutcome::Rejected => VerificationStage::Failed,
        };
        self.advance(session_id, stage)?;
        self.audit.record(
            AuditEvent::reviewer(
                AuditEventType::AttemptCompleted,
                Utc::now(),
                session_id.clone(),
                decision.review_id,
                decision.decided_by.clone(),
                Some(serde_json::json!({ "stage": stage })),
            ),
        );
        self.store
            .latest(session_id)
            .ok_or_else(|| WorkflowError::UnknownSession {
                session_id: session_id.to_string(),
            })
    }

    /// Run the SLA scan and audit every newly-escalated item.
    pub fn escalate_overdue_reviews(&self) -> Vec<ReviewItem> {
        let escalated = self.queue.escalate_overdue(Utc::now());
        for item in &escalated {
            self.audit.record(
                AuditEvent::system(
                    AuditEventType::ReviewEscalated,
                    Utc::now(),
                    Some(item.session_id.clone()),
                    Some(serde_json::json!({
                        "priority": item.priority,
                        "sla_deadline": item.sla_deadline,
                    })),
                )
                .with_review(item.review_id),
            );
        }
        escalated
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish()
    }
}
