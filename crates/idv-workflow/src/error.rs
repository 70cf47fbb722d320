//! Workflow-level errors.
//!
//! Adapter failures are not errors here: the orchestrator maps them to
//! attempt outcomes (FAIL or ERRORED). This type covers misuse of the
//! workflow itself — unknown sessions, budget violations, and lifecycle
//! violations bubbling up from the core state machinery.

use thiserror::Error;

use idv_core::IdvError;

/// Errors returned by orchestrator entry points.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The session has no recorded attempt.
    #[error("session {session_id} has no verification attempt")]
    UnknownSession {
        /// The session that was looked up.
        session_id: String,
    },

    /// An attempt is already running for this session.
    #[error("session {session_id} already has an attempt in progress")]
    AttemptInProgress {
        /// The busy session.
        session_id: String,
    },

    /// The session's latest attempt is not awaiting a review verdict.
    #[error("session {session_id} is not awaiting review (stage {stage})")]
    NotAwaitingReview {
        /// The session the verdict was aimed at.
        session_id: String,
        /// The stage the latest attempt is actually in.
        stage: String,
    },

    /// Validation, state machine, or concurrency violation from the core.
    #[error(transparent)]
    Core(#[from] IdvError),
}

impl From<idv_core::ValidationError> for WorkflowError {
    fn from(e: idv_core::ValidationError) -> Self {
        Self::Core(e.into())
    }
}

impl From<idv_core::StateTransitionError> for WorkflowError {
    fn from(e: idv_core::StateTransitionError) -> Self {
        Self::Core(e.into())
    }
}
