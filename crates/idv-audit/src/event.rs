//! # Audit Events
//!
//! Every externally-visible action in the stack produces one audit event:
//! session lifecycle, evidence service calls, engine decisions, queue
//! operations, and SLA escalations.
//!
//! ## Security Invariant
//!
//! Events carry identifiers and scores only — never raw document images,
//! extracted field values, or other holder PII. Each event is individually
//! digestable for tamper-evidence verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use idv_core::{ReviewId, ReviewerId, SessionId};

// ---------------------------------------------------------------------------
// AuditEventType
// ---------------------------------------------------------------------------

/// The type of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A verification attempt started.
    AttemptStarted,
    /// An evidence service call succeeded.
    EvidenceReceived,
    /// An evidence service call failed after retries.
    EvidenceFailed,
    /// The decision engine evaluated an evidence bundle.
    DecisionEvaluated,
    /// A session was routed to the review queue.
    ReviewEnqueued,
    /// A reviewer claimed a review item.
    ReviewClaimed,
    /// A reviewer recorded a verdict.
    ReviewDecided,
    /// The SLA scan escalated an overdue review item.
    ReviewEscalated,
    /// A verification attempt reached a terminal state.
    AttemptCompleted,
}

impl AuditEventType {
    /// Return the string value for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttemptStarted => "attempt_started",
            Self::EvidenceReceived => "evidence_received",
            Self::EvidenceFailed => "evidence_failed",
            Self::DecisionEvaluated => "decision_evaluated",
            Self::ReviewEnqueued => "review_enqueued",
            Self::ReviewClaimed => "review_claimed",
            Self::ReviewDecided => "review_decided",
            Self::ReviewEscalated => "review_escalated",
            Self::AttemptCompleted => "attempt_completed",
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditResult
// ---------------------------------------------------------------------------

/// Whether the audited action succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    /// The action completed as intended.
    Success,
    /// The action failed (service failure, timeout, aborted attempt).
    Failure,
}

impl AuditResult {
    /// Return the string value for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for AuditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditActor
// ---------------------------------------------------------------------------

/// Who performed the audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum AuditActor {
    /// The orchestrator, engine, or SLA scanner acting autonomously.
    System,
    /// A human reviewer.
    Reviewer(ReviewerId),
}

impl std::fmt::Display for AuditActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Reviewer(id) => write!(f, "reviewer:{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// AuditEvent
// ---------------------------------------------------------------------------

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// The type of audited action.
    pub event_type: AuditEventType,
    /// UTC instant the action happened.
    pub timestamp: DateTime<Utc>,
    /// The verification session, when the action concerns one.
    pub session_id: Option<SessionId>,
    /// The review item, when the action concerns one.
    pub review_id: Option<ReviewId>,
    /// Who performed the action.
    pub actor: AuditActor,
    /// Whether the action succeeded.
    pub result: AuditResult,
    /// Structured, PII-free detail payload.
    pub metadata: Option<serde_json::Value>,
}

impl AuditEvent {
    /// Create a system-actor event.
    pub fn system(
        event_type: AuditEventType,
        timestamp: DateTime<Utc>,
        session_id: Option<SessionId>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            timestamp,
            session_id,
            review_id: None,
            actor: AuditActor::System,
            result: AuditResult::Success,
            metadata,
        }
    }

    /// Create a reviewer-actor event for a review item.
    pub fn reviewer(
        event_type: AuditEventType,
        timestamp: DateTime<Utc>,
        session_id: SessionId,
        review_id: ReviewId,
        reviewer: ReviewerId,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            timestamp,
            session_id: Some(session_id),
            review_id: Some(review_id),
            actor: AuditActor::Reviewer(reviewer),
            result: AuditResult::Success,
            metadata,
        }
    }

    /// Attach a review item to the event.
    pub fn with_review(mut self, review_id: ReviewId) -> Self {
        self.review_id = Some(review_id);
        self
    }

    /// Mark the audited action as failed.
    pub fn failed(mut self) -> Self {
        self.result = AuditResult::Failure;
        self
    }

    /// Compute the sha256 content digest of this event as lowercase hex.
    ///
    /// Digested over the canonical JSON encoding; returns `None` if the
    /// metadata payload cannot be serialized.
    pub fn digest(&self) -> Option<String> {
        let canonical = match serde_json::to_vec(self) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    event_type = %self.event_type,
                    error = %e,
                    "audit event serialization failed, digest unavailable"
                );
                return None;
            }
        };
        let digest = Sha256::digest(&canonical);
        let mut hex = String::with_capacity(64);
        for byte in digest {
            use std::fmt::Write;
            // Infallible for String, but write! is fallible by signature.
            let _ = write!(hex, "{byte:02x}");
        }
        Some(hex)
    }
}
