//! End-to-end pipeline tests: scripted evidence services through the
//! orchestrator, decision engine, review queue, and audit trail.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use idv_audit::{AuditEventType, AuditSink, MemoryAuditSink};
use idv_core::{ImageRef, ReviewerId, SessionId, VerificationConfig};
use idv_decision::{DecisionOutcome, HardFailCode, ReviewPriority};
use idv_evidence::fake::{
    clean_document, live_result, not_live_result, similarity_result, FakeDocumentAnalyzer,
    FakeFaceComparator, FakeLivenessProvider,
};
use idv_evidence::AdapterError;
use idv_queue::{ReviewOutcome, ReviewStatus};
use idv_workflow::{Orchestrator, VerificationRequest, VerificationStage, WorkflowError};

struct Harness {
    orchestrator: Orchestrator,
    documents: Arc<FakeDocumentAnalyzer>,
    liveness: Arc<FakeLivenessProvider>,
    faces: Arc<FakeFaceComparator>,
    audit: Arc<MemoryAuditSink>,
}

fn fast_config() -> VerificationConfig {
    let mut config = VerificationConfig::default();
    config.retry.base_delay = Duration::from_millis(5);
    config.retry.call_timeout = Duration::from_millis(500);
    config.overall_timeout = Duration::from_secs(5);
    config
}

fn harness(
    documents: FakeDocumentAnalyzer,
    liveness: FakeLivenessProvider,
    faces: FakeFaceComparator,
) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let documents = Arc::new(documents);
    let liveness = Arc::new(liveness);
    let faces = Arc::new(faces);
    let audit = Arc::new(MemoryAuditSink::new(1_000));
    let orchestrator = Orchestrator::new(
        fast_config(),
        documents.clone(),
        liveness.clone(),
        faces.clone(),
        Arc::new(idv_queue::ReviewQueue::new()),
        audit.clone() as Arc<dyn AuditSink>,
    );
    Harness {
        orchestrator,
        documents,
        liveness,
        faces,
        audit,
    }
}

fn clean_harness() -> Harness {
    harness(
        FakeDocumentAnalyzer::returning(clean_document(95.0)),
        FakeLivenessProvider::returning(live_result(97.0)),
        FakeFaceComparator::returning(similarity_result(94.0)),
    )
}

fn request(session: &str) -> VerificationRequest {
    VerificationRequest {
        session_id: SessionId::new(session).unwrap(),
        document_image: ImageRef::new("img/front").unwrap(),
        back_image: None,
        liveness_session: "live-sess-1".to_string(),
    }
}

#[tokio::test]
async fn clean_session_passes_automatically() {
    let h = clean_harness();
    let attempt = h.orchestrator.verify(request("sess-clean")).await.unwrap();

    assert_eq!(attempt.stage, VerificationStage::Passed);
    let decision = attempt.decision.unwrap();
    assert_eq!(decision.outcome, DecisionOutcome::Pass);
    assert!(attempt.review_id.is_none());
    assert!(attempt.error.is_none());

    // Full path: gathering -> comparison -> deciding -> passed.
    let path: Vec<_> = attempt.transitions.iter().map(|t| t.to).collect();
    assert_eq!(
        path,
        vec![
            VerificationStage::FaceComparison,
            VerificationStage::Deciding,
            VerificationStage::Passed,
        ]
    );

    assert_eq!(h.documents.call_count(), 1);
    assert_eq!(h.liveness.call_count(), 1);
    assert_eq!(h.faces.call_count(), 1);

    let session = SessionId::new("sess-clean").unwrap();
    let events: Vec<_> = h
        .audit
        .events_for_session(&session)
        .iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(events[0], AuditEventType::AttemptStarted);
    assert_eq!(
        events.last().copied(),
        Some(AuditEventType::AttemptCompleted)
    );
    assert!(events.contains(&AuditEventType::DecisionEvaluated));
}

#[tokio::test]
async fn failed_liveness_gates_out_face_comparison() {
    let h = harness(
        FakeDocumentAnalyzer::returning(clean_document(95.0)),
        FakeLivenessProvider::returning(not_live_result()),
        FakeFaceComparator::returning(similarity_result(94.0)),
    );
    let attempt = h.orchestrator.verify(request("sess-spoof")).await.unwrap();

    assert_eq!(attempt.stage, VerificationStage::Failed);
    assert_eq!(
        attempt.decision.unwrap().hard_fail,
        Some(HardFailCode::LivenessFailed)
    );
    // The gate short-circuits the expensive call.
    assert_eq!(h.faces.call_count(), 0);
}

#[tokio::test]
async fn expired_document_fails_without_comparison() {
    let mut expired = clean_document(95.0);
    expired.is_expired = true;
    let h = harness(
        FakeDocumentAnalyzer::returning(expired),
        FakeLivenessProvider::returning(live_result(97.0)),
        FakeFaceComparator::returning(similarity_result(94.0)),
    );
    let attempt = h.orchestrator.verify(request("sess-expired")).await.unwrap();

    assert_eq!(attempt.stage, VerificationStage::Failed);
    assert_eq!(
        attempt.decision.unwrap().hard_fail,
        Some(HardFailCode::DocumentExpired)
    );
    assert_eq!(h.faces.call_count(), 0);
}

#[tokio::test]
async fn no_face_in_compare_is_fail_not_error() {
    let h = clean_harness();
    h.faces.push_result(Err(AdapterError::NoFaceDetected {
        service: "face_compare",
    }));
    let attempt = h.orchestrator.verify(request("sess-noface")).await.unwrap();

    assert_eq!(attempt.stage, VerificationStage::Failed);
    assert_eq!(
        attempt.decision.unwrap().hard_fail,
        Some(HardFailCode::NoFaceDetected)
    );
    assert!(attempt.error.is_none());
}

#[tokio::test]
async fn failing_similarity_with_borderline_ocr_fails_outright() {
    let h = harness(
        FakeDocumentAnalyzer::returning(clean_document(72.0)),
        FakeLivenessProvider::returning(live_result(97.0)),
        FakeFaceComparator::returning(similarity_result(65.0)),
    );
    let attempt = h.orchestrator.verify(request("sess-mismatch")).await.unwrap();

    assert_eq!(attempt.stage, VerificationStage::Failed);
    let decision = attempt.decision.unwrap();
    assert_eq!(
        decision.hard_fail,
        Some(HardFailCode::SimilarityBelowMinimum)
    );
    // The borderline OCR signal never surfaces next to a hard fail.
    assert!(decision.review_reasons.is_empty());
    assert!(attempt.review_id.is_none());
}

#[tokio::test]
async fn borderline_similarity_routes_to_review_and_approval_passes() {
    let h = harness(
        FakeDocumentAnalyzer::returning(clean_document(95.0)),
        FakeLivenessProvider::returning(live_result(97.0)),
        FakeFaceComparator::returning(similarity_result(84.0)),
    );
    let attempt = h.orchestrator.verify(request("sess-border")).await.unwrap();

    assert_eq!(attempt.stage, VerificationStage::AwaitingReview);
    let review_id = attempt.review_id.unwrap();
    let item = h.orchestrator.queue().get(review_id).unwrap();
    assert_eq!(item.status, ReviewStatus::Pending);
    assert_eq!(item.priority, ReviewPriority::Normal);

    let reviewer = ReviewerId::new("reviewer-1").unwrap();
    h.orchestrator.claim_review(review_id, &reviewer).unwrap();
    let finished = h
        .orchestrator
        .decide_review(review_id, &reviewer, ReviewOutcome::Approved, None)
        .unwrap();

    assert_eq!(finished.stage, VerificationStage::Passed);
    assert_eq!(
        h.orchestrator.queue().get(review_id).unwrap().status,
        ReviewStatus::Completed
    );

    let session = SessionId::new("sess-border").unwrap();
    let events: Vec<_> = h
        .audit
        .events_for_session(&session)
        .iter()
        .map(|e| e.event_type)
        .collect();
    assert!(events.contains(&AuditEventType::ReviewEnqueued));
    assert!(events.contains(&AuditEventType::ReviewClaimed));
    assert!(events.contains(&AuditEventType::ReviewDecided));
    assert_eq!(
        events.last().copied(),
        Some(AuditEventType::AttemptCompleted)
    );
}

#[tokio::test]
async fn rejection_verdict_fails_the_session() {
    let h = harness(
        FakeDocumentAnalyzer::returning(clean_document(80.0)),
        FakeLivenessProvider::returning(live_result(97.0)),
        FakeFaceComparator::returning(similarity_result(94.0)),
    );
    let attempt = h.orchestrator.verify(request("sess-reject")).await.unwrap();
    let review_id = attempt.review_id.unwrap();

    let reviewer = ReviewerId::new("reviewer-2").unwrap();
    h.orchestrator.claim_review(review_id, &reviewer).unwrap();
    let finished = h
        .orchestrator
        .decide_review(
            review_id,
            &reviewer,
            ReviewOutcome::Rejected,
            Some("photo mismatch".to_string()),
        )
        .unwrap();
    assert_eq!(finished.stage, VerificationStage::Failed);
}

#[tokio::test]
async fn transient_failures_retry_and_recover() {
    let h = clean_harness();
    h.documents.push_result(Err(AdapterError::Transient {
        service: "document_analysis",
        reason: "503".to_string(),
    }));
    let attempt = h.orchestrator.verify(request("sess-retry")).await.unwrap();

    assert_eq!(attempt.stage, VerificationStage::Passed);
    assert_eq!(h.documents.call_count(), 2);
}

#[tokio::test]
async fn exhausted_retries_error_the_attempt_not_fail_it() {
    let h = clean_harness();
    for _ in 0..3 {
        h.liveness.push_result(Err(AdapterError::Transient {
            service: "face_liveness",
            reason: "connection reset".to_string(),
        }));
    }
    let attempt = h.orchestrator.verify(request("sess-down")).await.unwrap();

    assert_eq!(attempt.stage, VerificationStage::Errored);
    assert!(attempt.decision.is_none());
    assert!(attempt.error.is_some());

    // ERRORED is retryable: a fresh attempt within the budget succeeds.
    let second = h.orchestrator.verify(request("sess-down")).await.unwrap();
    assert_eq!(second.number, 2);
    assert_eq!(second.stage, VerificationStage::Passed);
}

#[tokio::test]
async fn attempt_budget_is_enforced() {
    let h = harness(
        FakeDocumentAnalyzer::returning(clean_document(95.0)),
        FakeLivenessProvider::returning(not_live_result()),
        FakeFaceComparator::returning(similarity_result(94.0)),
    );
    for _ in 0..3 {
        h.orchestrator.verify(request("sess-budget")).await.unwrap();
    }
    let err = h.orchestrator.verify(request("sess-budget")).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Core(_)));
    assert_eq!(
        h.orchestrator
            .attempt_history(&SessionId::new("sess-budget").unwrap())
            .len(),
        3
    );
}

#[tokio::test]
async fn second_reviewer_cannot_steal_a_claim() {
    let h = harness(
        FakeDocumentAnalyzer::returning(clean_document(95.0)),
        FakeLivenessProvider::returning(live_result(80.0)),
        FakeFaceComparator::returning(similarity_result(94.0)),
    );
    let attempt = h.orchestrator.verify(request("sess-race")).await.unwrap();
    let review_id = attempt.review_id.unwrap();

    let first = ReviewerId::new("reviewer-1").unwrap();
    let second = ReviewerId::new("reviewer-2").unwrap();
    h.orchestrator.claim_review(review_id, &first).unwrap();
    assert!(h.orchestrator.claim_review(review_id, &second).is_err());

    // The loser cannot decide either.
    assert!(h
        .orchestrator
        .decide_review(review_id, &second, ReviewOutcome::Approved, None)
        .is_err());
}

#[tokio::test]
async fn overdue_review_escalates_and_remains_decidable() {
    let h = harness(
        FakeDocumentAnalyzer::returning(clean_document(95.0)),
        FakeLivenessProvider::returning(live_result(97.0)),
        FakeFaceComparator::returning(similarity_result(75.0)),
    );
    let attempt = h.orchestrator.verify(request("sess-sla")).await.unwrap();
    let review_id = attempt.review_id.unwrap();

    // Scan from a point past the 24h SLA window.
    let escalated = h
        .orchestrator
        .queue()
        .escalate_overdue(Utc::now() + chrono::Duration::hours(25));
    assert_eq!(escalated.len(), 1);
    assert_eq!(escalated[0].review_id, review_id);
    assert_eq!(
        h.orchestrator.queue().get(review_id).unwrap().status,
        ReviewStatus::Escalated
    );

    let reviewer = ReviewerId::new("reviewer-3").unwrap();
    h.orchestrator.claim_review(review_id, &reviewer).unwrap();
    let finished = h
        .orchestrator
        .decide_review(review_id, &reviewer, ReviewOutcome::Approved, None)
        .unwrap();
    assert_eq!(finished.stage, VerificationStage::Passed);
}

#[tokio::test]
async fn session_awaiting_review_blocks_new_attempts() {
    let h = harness(
        FakeDocumentAnalyzer::returning(clean_document(95.0)),
        FakeLivenessProvider::returning(live_result(97.0)),
        FakeFaceComparator::returning(similarity_result(85.0)),
    );
    h.orchestrator.verify(request("sess-wait")).await.unwrap();
    let err = h.orchestrator.verify(request("sess-wait")).await.unwrap_err();
    assert!(matches!(err, WorkflowError::AttemptInProgress { .. }));
}

#[tokio::test]
async fn high_priority_review_for_strong_signals() {
    // Similarity below the high-severity line plus low OCR: two reasons.
    let h = harness(
        FakeDocumentAnalyzer::returning(clean_document(80.0)),
        FakeLivenessProvider::returning(live_result(97.0)),
        FakeFaceComparator::returning(similarity_result(75.0)),
    );
    let attempt = h.orchestrator.verify(request("sess-high")).await.unwrap();
    let item = h
        .orchestrator
        .queue()
        .get(attempt.review_id.unwrap())
        .unwrap();
    assert_eq!(item.priority, ReviewPriority::High);
    assert_eq!(item.reasons.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn overall_timeout_errors_the_attempt() {
    let mut config = fast_config();
    config.overall_timeout = Duration::from_millis(50);
    let documents = Arc::new(
        FakeDocumentAnalyzer::returning(clean_document(95.0))
            .with_delay(Duration::from_secs(120)),
    );
    let audit = Arc::new(MemoryAuditSink::new(100));
    let orchestrator = Orchestrator::new(
        config,
        documents,
        Arc::new(FakeLivenessProvider::returning(live_result(97.0))),
        Arc::new(FakeFaceComparator::returning(similarity_result(94.0))),
        Arc::new(idv_queue::ReviewQueue::new()),
        audit.clone() as Arc<dyn AuditSink>,
    );

    let attempt = orchestrator.verify(request("sess-slow")).await.unwrap();
    assert_eq!(attempt.stage, VerificationStage::Errored);
    assert!(attempt.error.unwrap().contains("timeout"));
}
