//! # Error Hierarchy
//!
//! Structured error types for the IDV Stack, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Each subsystem defines specific error variants that carry diagnostic
//! context: the operation that failed, the state at the time of failure, and
//! actionable information for operators. Concurrency violations (double
//! claim, double decide, duplicate enqueue) are surfaced as typed errors and
//! never silently retried — the caller decides.

use thiserror::Error;

/// Top-level error type for the IDV Stack.
#[derive(Error, Debug)]
pub enum IdvError {
    /// Domain primitive or contract validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// State machine transition violation.
    #[error("state transition error: {0}")]
    StateTransition(#[from] StateTransitionError),

    /// Failed conditional write against concurrently-mutated state.
    #[error("concurrency error: {0}")]
    Concurrency(#[from] ConcurrencyError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors for domain primitive newtypes and engine inputs.
///
/// Always a programming or contract error on the caller's side, never
/// retried. Each variant carries the invalid input so that operators can
/// diagnose the misuse without guesswork.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Session identifier is empty or exceeds the storage key limit.
    #[error("invalid session ID: \"{0}\" (expected 1-128 non-whitespace characters)")]
    InvalidSessionId(String),

    /// Reviewer identifier is empty or exceeds the storage key limit.
    #[error("invalid reviewer ID: \"{0}\" (expected 1-128 non-whitespace characters)")]
    InvalidReviewerId(String),

    /// Image reference handle is empty.
    #[error("invalid image reference: must be non-empty")]
    InvalidImageRef,

    /// A confidence or similarity score fell outside the 0-100 range.
    #[error("score out of range for {field}: {value} (expected 0-100)")]
    ScoreOutOfRange {
        /// The evidence field carrying the bad score.
        field: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Attempt number must be a positive integer within the configured budget.
    #[error("invalid attempt number {attempt} (budget is {max_attempts})")]
    AttemptOutOfBudget {
        /// The attempt number requested.
        attempt: u32,
        /// The configured maximum attempts per session.
        max_attempts: u32,
    },
}

/// Errors during state machine transitions.
#[derive(Error, Debug)]
pub enum StateTransitionError {
    /// The attempted transition is not valid from the current state.
    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// The current state name.
        from: String,
        /// The attempted target state name.
        to: String,
        /// Human-readable reason for the rejection.
        reason: String,
    },

    /// The record is in a terminal state and rejects all transitions.
    #[error("{record} is terminal in state {state}")]
    TerminalState {
        /// Identifier of the record being mutated.
        record: String,
        /// The terminal state name.
        state: String,
    },
}

/// Failed conditional writes against state mutated by concurrent actors.
///
/// The review queue's `assigned_to`/`status` pair is the only state subject
/// to concurrent external mutation; every violation surfaces here.
#[derive(Error, Debug)]
pub enum ConcurrencyError {
    /// A non-terminal review item already exists for the session.
    #[error("duplicate review for session {session_id}: item {review_id} is still open")]
    DuplicateReview {
        /// The session with an open review.
        session_id: String,
        /// The existing open review item.
        review_id: String,
    },

    /// The item was claimed by another reviewer first.
    #[error("review {review_id} already assigned to {assigned_to}")]
    AlreadyAssigned {
        /// The contested review item.
        review_id: String,
        /// The reviewer holding the assignment.
        assigned_to: String,
    },

    /// The caller is not the assigned reviewer.
    #[error("review {review_id} is not assigned to {reviewer_id}")]
    NotAssigned {
        /// The review item.
        review_id: String,
        /// The reviewer attempting the operation.
        reviewer_id: String,
    },

    /// A decision has already been recorded for this item.
    #[error("review {review_id} already decided")]
    AlreadyDecided {
        /// The completed review item.
        review_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idv_error_validation_display() {
        let inner = ValidationError::InvalidSessionId("".to_string());
        let err = IdvError::Validation(inner);
        let msg = format!("{err}");
        assert!(msg.contains("validation error"));
        assert!(msg.contains("session ID"));
    }

    #[test]
    fn idv_error_state_transition_display() {
        let inner = StateTransitionError::InvalidTransition {
            from: "PENDING".to_string(),
            to: "COMPLETED".to_string(),
            reason: "must be claimed first".to_string(),
        };
        let err = IdvError::StateTransition(inner);
        let msg = format!("{err}");
        assert!(msg.contains("PENDING"));
        assert!(msg.contains("COMPLETED"));
    }

    #[test]
    fn idv_error_concurrency_display() {
        let inner = ConcurrencyError::AlreadyAssigned {
            review_id: "review:abc".to_string(),
            assigned_to: "reviewer-1".to_string(),
        };
        let err = IdvError::Concurrency(inner);
        assert!(format!("{err}").contains("reviewer-1"));
    }

    #[test]
    fn validation_error_score_out_of_range() {
        let err = ValidationError::ScoreOutOfRange {
            field: "similarity",
            value: 101.5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("similarity"));
        assert!(msg.contains("101.5"));
    }

    #[test]
    fn validation_error_attempt_out_of_budget() {
        let err = ValidationError::AttemptOutOfBudget {
            attempt: 4,
            max_attempts: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains('4'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn state_transition_error_terminal_state() {
        let err = StateTransitionError::TerminalState {
            record: "review:abc".to_string(),
            state: "COMPLETED".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("review:abc"));
        assert!(msg.contains("COMPLETED"));
    }

    #[test]
    fn concurrency_error_duplicate_review() {
        let err = ConcurrencyError::DuplicateReview {
            session_id: "sess-1".to_string(),
            review_id: "review:abc".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("sess-1"));
        assert!(msg.contains("review:abc"));
    }

    #[test]
    fn concurrency_error_not_assigned() {
        let err = ConcurrencyError::NotAssigned {
            review_id: "review:abc".to_string(),
            reviewer_id: "reviewer-2".to_string(),
        };
        assert!(format!("{err}").contains("reviewer-2"));
    }

    #[test]
    fn concurrency_error_already_decided() {
        let err = ConcurrencyError::AlreadyDecided {
            review_id: "review:abc".to_string(),
        };
        assert!(format!("{err}").contains("already decided"));
    }

    #[test]
    fn all_error_types_are_debug() {
        let e1 = IdvError::Concurrency(ConcurrencyError::AlreadyDecided {
            review_id: "x".to_string(),
        });
        let e2 = ValidationError::InvalidImageRef;
        let e3 = StateTransitionError::TerminalState {
            record: "x".to_string(),
            state: "y".to_string(),
        };
        assert!(!format!("{e1:?}").is_empty());
        assert!(!format!("{e2:?}").is_empty());
        assert!(!format!("{e3:?}").is_empty());
    }
}
