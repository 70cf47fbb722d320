//! # Verification Attempt Lifecycle
//!
//! One attempt is one pass of a session through the pipeline. Every stage
//! change is appended to the attempt's transition log, so the full path a
//! session took — including which gates short-circuited — is replayable
//! from the record alone.
//!
//! ## State Machine
//!
//! ```text
//! EVIDENCE_GATHERING ──▶ FACE_COMPARISON ──▶ DECIDING ──▶ PASSED
//!        │                      │               │    ├──▶ FAILED
//!        │ (gate tripped)       │               │    └──▶ AWAITING_REVIEW ──▶ PASSED / FAILED
//!        ├──────────────────────┼───────────────┘
//!        └──▶ ERRORED ◀─────────┘
//! ```
//!
//! ERRORED means the pipeline could not complete (exhausted retries,
//! permanent service failure, overall timeout). It is deliberately
//! distinct from FAILED, which is a decision about the evidence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use idv_core::{ImageRef, ReviewId, SessionId, StateTransitionError};
use idv_decision::Decision;
use idv_evidence::{DocumentEvidence, LivenessEvidence, SimilarityEvidence};

// ---------------------------------------------------------------------------
// VerificationStage
// ---------------------------------------------------------------------------

/// Stage of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStage {
    /// Document analysis and liveness run in parallel.
    EvidenceGathering,
    /// Both gates passed; comparing document face to liveness reference.
    FaceComparison,
    /// All evidence collected; the engine is evaluating.
    Deciding,
    /// Routed to the review queue; a human verdict is pending.
    AwaitingReview,
    /// Verified. Terminal.
    Passed,
    /// Rejected. Terminal.
    Failed,
    /// The pipeline could not complete. Terminal; retryable by a new
    /// attempt within the budget.
    Errored,
}

impl VerificationStage {
    /// The canonical string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EvidenceGathering => "EVIDENCE_GATHERING",
            Self::FaceComparison => "FACE_COMPARISON",
            Self::Deciding => "DECIDING",
            Self::AwaitingReview => "AWAITING_REVIEW",
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Errored => "ERRORED",
        }
    }

    /// Whether this stage ends the attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Errored)
    }

    /// The stages reachable from this one.
    pub fn valid_transitions(&self) -> &'static [VerificationStage] {
        match self {
            // A tripped gate skips face comparison and goes straight to
            // the decision; any stage with in-flight calls can error out.
            Self::EvidenceGathering => &[Self::FaceComparison, Self::Deciding, Self::Errored],
            Self::FaceComparison => &[Self::Deciding, Self::Errored],
            Self::Deciding => &[Self::Passed, Self::Failed, Self::AwaitingReview],
            Self::AwaitingReview => &[Self::Passed, Self::Failed],
            Self::Passed | Self::Failed | Self::Errored => &[],
        }
    }

    /// Whether transitioning to `next` is allowed from this stage.
    pub fn can_transition_to(&self, next: VerificationStage) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl std::fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StageTransition
// ---------------------------------------------------------------------------

/// One entry in an attempt's transition log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    /// The stage left.
    pub from: VerificationStage,
    /// The stage entered.
    pub to: VerificationStage,
    /// When the transition happened.
    pub at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// VerificationRequest
// ---------------------------------------------------------------------------

/// Input to one verification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    /// The session being verified.
    pub session_id: SessionId,
    /// Front image of the identity document.
    pub document_image: ImageRef,
    /// Back image, when the document type has one.
    pub back_image: Option<ImageRef>,
    /// Handle of the completed liveness capture session.
    pub liveness_session: String,
}

// ---------------------------------------------------------------------------
// VerificationAttempt
// ---------------------------------------------------------------------------

/// The durable record of one verification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationAttempt {
    /// The session this attempt belongs to.
    pub session_id: SessionId,
    /// 1-based attempt number within the session's budget.
    pub number: u32,
    /// Current stage.
    pub stage: VerificationStage,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// When the attempt reached a terminal stage.
    pub completed_at: Option<DateTime<Utc>>,
    /// Every stage change, in order.
    pub transitions: Vec<StageTransition>,
    /// Document-analysis evidence, once gathered.
    pub document: Option<DocumentEvidence>,
    /// Liveness evidence, once gathered.
    pub liveness: Option<LivenessEvidence>,
    /// Face-similarity evidence, once the comparison ran. Absent when a
    /// gate short-circuited the pipeline.
    pub similarity: Option<SimilarityEvidence>,
    /// The engine's decision, once one exists.
    pub decision: Option<Decision>,
    /// The review item created for a REVIEW decision.
    pub review_id: Option<ReviewId>,
    /// Why the attempt ERRORED, when it did.
    pub error: Option<String>,
}

impl VerificationAttempt {
    /// Start a fresh attempt in EVIDENCE_GATHERING.
    pub fn new(session_id: SessionId, number: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            number,
            stage: VerificationStage::EvidenceGathering,
            started_at,
            completed_at: None,
            transitions: Vec::new(),
            document: None,
            liveness: None,
            similarity: None,
            decision: None,
            review_id: None,
            error: None,
        }
    }

    /// Move to the next stage, recording the transition.
    ///
    /// # Errors
    ///
    /// Returns [`StateTransitionError`] if the move is not in the stage
    /// machine, including any move out of a terminal stage.
    pub fn advance(
        &mut self,
        to: VerificationStage,
        at: DateTime<Utc>,
    ) -> Result<(), StateTransitionError> {
        if self.stage.is_terminal() {
            return Err(StateTransitionError::TerminalState {
                record: format!("attempt {}#{}", self.session_id, self.number),
                state: self.stage.to_string(),
            });
        }
        if !self.stage.can_transition_to(to) {
            return Err(StateTransitionError::InvalidTransition {
                from: self.stage.to_string(),
                to: to.to_string(),
                reason: "not reachable in the attempt stage machine".to_string(),
            });
        }
        self.transitions.push(StageTransition {
            from: self.stage,
            to,
            at,
        });
        self.stage = to;
        if to.is_terminal() {
            self.completed_at = Some(at);
        }
        Ok(())
    }

    /// Whether the attempt has ended.
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}
