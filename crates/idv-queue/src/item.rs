//! # Review Item Lifecycle
//!
//! A review item is created when the decision engine routes a session to
//! human review, claimed by exactly one reviewer, and decided exactly once.
//!
//! ## State Machine
//!
//! ```text
//! PENDING ──claim──▶ IN_PROGRESS ──decide──▶ COMPLETED (terminal)
//!    │                    │
//!    └──sla──▶ ESCALATED ◀┘ (still claimable and decidable)
//! ```
//!
//! ESCALATED is a visibility flag, not a dead end: an overdue item can
//! still be claimed and decided, and its transition to COMPLETED is the
//! only way it leaves the queue. COMPLETED is the sole terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use idv_core::{ReviewId, ReviewerId, SessionId};
use idv_decision::{ReviewPriority, ReviewReason};

// ---------------------------------------------------------------------------
// ReviewStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a review queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    /// Enqueued, not yet claimed by any reviewer.
    Pending,
    /// Claimed by exactly one reviewer.
    InProgress,
    /// Past its SLA deadline without a decision. Still claimable.
    Escalated,
    /// Decided. Terminal.
    Completed,
}

impl ReviewStatus {
    /// The canonical string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Escalated => "ESCALATED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Whether this state rejects all further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The states reachable from this one.
    pub fn valid_transitions(&self) -> &'static [ReviewStatus] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Escalated],
            Self::InProgress => &[Self::Completed, Self::Escalated],
            Self::Escalated => &[Self::InProgress, Self::Completed],
            Self::Completed => &[],
        }
    }

    /// Whether transitioning to `next` is allowed from this state.
    pub fn can_transition_to(&self, next: ReviewStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReviewOutcome
// ---------------------------------------------------------------------------

/// The reviewer's verdict, propagated back to the verification session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewOutcome {
    /// The reviewer confirmed the identity; the session passes.
    Approved,
    /// The reviewer rejected the identity; the session fails.
    Rejected,
}

impl ReviewOutcome {
    /// The canonical string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReviewItem
// ---------------------------------------------------------------------------

/// One entry in the review queue.
///
/// Priority and reasons are computed once by the decision engine at
/// enqueue time and never recomputed here; the queue only orders by them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Unique identifier, never reused.
    pub review_id: ReviewId,
    /// The verification session awaiting review.
    pub session_id: SessionId,
    /// Priority fixed at decision time.
    pub priority: ReviewPriority,
    /// The reasons that routed the session to review.
    pub reasons: Vec<ReviewReason>,
    /// Current lifecycle state.
    pub status: ReviewStatus,
    /// Enqueue instant; ties in priority ordering break on this, oldest
    /// first.
    pub created_at: DateTime<Utc>,
    /// Instant past which an undecided item escalates.
    pub sla_deadline: DateTime<Utc>,
    /// The reviewer holding the claim, if any.
    pub assigned_to: Option<ReviewerId>,
    /// Instant of the successful claim.
    pub claimed_at: Option<DateTime<Utc>>,
    /// Instant of the decision.
    pub decided_at: Option<DateTime<Utc>>,
    /// The recorded verdict. Present iff status is COMPLETED.
    pub outcome: Option<ReviewOutcome>,
    /// Free-text notes recorded with the decision.
    pub notes: Option<String>,
    /// Instant the SLA scan flagged the item, if it ever escalated.
    pub escalated_at: Option<DateTime<Utc>>,
}

impl ReviewItem {
    /// Create a fresh PENDING item.
    pub fn new(
        session_id: SessionId,
        priority: ReviewPriority,
        reasons: Vec<ReviewReason>,
        created_at: DateTime<Utc>,
        sla_deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            review_id: ReviewId::new(),
            session_id,
            priority,
            reasons,
            status: ReviewStatus::Pending,
            created_at,
            sla_deadline,
            assigned_to: None,
            claimed_at: None,
            decided_at: None,
            outcome: None,
            notes: None,
            escalated_at: None,
        }
    }

    /// Whether the item still counts as open for the one-open-review-per-
    /// session rule.
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Whether the item is past its SLA deadline at `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.sla_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item() -> ReviewItem {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        ReviewItem::new(
            SessionId::new("sess-1").unwrap(),
            ReviewPriority::Normal,
            Vec::new(),
            created,
            created + chrono::Duration::hours(24),
        )
    }

    #[test]
    fn new_item_is_pending_and_unassigned() {
        let item = item();
        assert_eq!(item.status, ReviewStatus::Pending);
        assert!(item.assigned_to.is_none());
        assert!(item.outcome.is_none());
        assert!(item.is_open());
    }

    #[test]
    fn status_strings() {
        assert_eq!(ReviewStatus::Pending.as_str(), "PENDING");
        assert_eq!(ReviewStatus::InProgress.as_str(), "IN_PROGRESS");
        assert_eq!(ReviewStatus::Escalated.as_str(), "ESCALATED");
        assert_eq!(ReviewStatus::Completed.as_str(), "COMPLETED");
    }

    #[test]
    fn only_completed_is_terminal() {
        assert!(!ReviewStatus::Pending.is_terminal());
        assert!(!ReviewStatus::InProgress.is_terminal());
        assert!(!ReviewStatus::Escalated.is_terminal());
        assert!(ReviewStatus::Completed.is_terminal());
    }

    #[test]
    fn transition_matrix() {
        use ReviewStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Escalated));
        assert!(!Pending.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Escalated));
        assert!(!InProgress.can_transition_to(Pending));
        assert!(Escalated.can_transition_to(InProgress));
        assert!(Escalated.can_transition_to(Completed));
        assert!(!Escalated.can_transition_to(Pending));
        assert!(Completed.valid_transitions().is_empty());
    }

    #[test]
    fn overdue_is_strict() {
        let item = item();
        assert!(!item.is_overdue(item.sla_deadline));
        assert!(item.is_overdue(item.sla_deadline + chrono::Duration::seconds(1)));
    }

    #[test]
    fn outcome_strings_and_serde() {
        assert_eq!(ReviewOutcome::Approved.as_str(), "APPROVED");
        assert_eq!(ReviewOutcome::Rejected.to_string(), "REJECTED");
        let json = serde_json::to_string(&ReviewOutcome::Approved).unwrap();
        assert_eq!(json, "\"APPROVED\"");
    }

    #[test]
    fn item_serde_roundtrip() {
        let item = item();
        let json = serde_json::to_string(&item).unwrap();
        let back: ReviewItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
        assert!(json.contains("PENDING"));
    }
}
