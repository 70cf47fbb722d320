//! # Attempt Store
//!
//! Concurrent in-memory store of verification attempts, keyed by session.
//! Enforces the two session-level invariants: at most one attempt runs at
//! a time, and a session never exceeds its attempt budget.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use idv_core::{SessionId, ValidationError};

use crate::attempt::VerificationAttempt;
use crate::error::WorkflowError;

/// Attempt history per session.
#[derive(Debug, Default)]
pub struct AttemptStore {
    attempts: DashMap<SessionId, Vec<VerificationAttempt>>,
}

impl AttemptStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new attempt for a session.
    ///
    /// The budget check and the insert happen under one shard lock, so two
    /// concurrent starts for the same session cannot both succeed.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::AttemptInProgress`] if the latest attempt is not
    /// terminal; [`ValidationError::AttemptOutOfBudget`] if the session has
    /// used all its attempts.
    pub fn begin(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<VerificationAttempt, WorkflowError> {
        let mut history = self.attempts.entry(session_id.clone()).or_default();
        if let Some(last) = history.last() {
            if !last.is_terminal() {
                return Err(WorkflowError::AttemptInProgress {
                    session_id: session_id.to_string(),
                });
            }
        }
        let number = history.len() as u32 + 1;
        if number > max_attempts {
            return Err(ValidationError::AttemptOutOfBudget {
                attempt: number,
                max_attempts,
            }
            .into());
        }
        let attempt = VerificationAttempt::new(session_id.clone(), number, now);
        history.push(attempt.clone());
        Ok(attempt)
    }

    /// Mutate the latest attempt for a session under its shard lock.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownSession`] if no attempt exists.
    pub fn update<R>(
        &self,
        session_id: &SessionId,
        f: impl FnOnce(&mut VerificationAttempt) -> R,
    ) -> Result<R, WorkflowError> {
        let mut history =
            self.attempts
                .get_mut(session_id)
                .ok_or_else(|| WorkflowError::UnknownSession {
                    session_id: session_id.to_string(),
                })?;
        let attempt = history.last_mut().ok_or_else(|| WorkflowError::UnknownSession {
            session_id: session_id.to_string(),
        })?;
        Ok(f(attempt))
    }

    /// Snapshot of the latest attempt for a session.
    pub fn latest(&self, session_id: &SessionId) -> Option<VerificationAttempt> {
        self.attempts
            .get(session_id)
            .and_then(|history| history.last().cloned())
    }

    /// Snapshot of the full attempt history for a session, oldest first.
    pub fn history(&self, session_id: &SessionId) -> Vec<VerificationAttempt> {
        self.attempts
            .get(session_id)
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Number of attempts recorded for a session.
    pub fn attempt_count(&self, session_id: &SessionId) -> u32 {
        self.attempts
            .get(session_id)
            .map(|history| history.len() as u32)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use idv_core::IdvError;

    use crate::attempt::VerificationStage;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn session() -> SessionId {
        SessionId::new("sess-1").unwrap()
    }

    fn finish(store: &AttemptStore, stage: VerificationStage) {
        store
            .update(&session(), |a| {
                if a.stage == VerificationStage::EvidenceGathering
                    && stage != VerificationStage::Errored
                {
                    a.advance(VerificationStage::Deciding, t0()).unwrap();
                }
                a.advance(stage, t0()).unwrap();
            })
            .unwrap();
    }

    #[test]
    fn begin_numbers_attempts() {
        let store = AttemptStore::new();
        let first = store.begin(&session(), t0(), 3).unwrap();
        assert_eq!(first.number, 1);
        finish(&store, VerificationStage::Failed);

        let second = store.begin(&session(), t0(), 3).unwrap();
        assert_eq!(second.number, 2);
        assert_eq!(store.attempt_count(&session()), 2);
        assert_eq!(store.history(&session()).len(), 2);
    }

    #[test]
    fn begin_rejects_concurrent_attempt() {
        let store = AttemptStore::new();
        store.begin(&session(), t0(), 3).unwrap();
        let err = store.begin(&session(), t0(), 3).unwrap_err();
        assert!(matches!(err, WorkflowError::AttemptInProgress { .. }));
    }

    #[test]
    fn begin_enforces_budget() {
        let store = AttemptStore::new();
        for _ in 0..3 {
            store.begin(&session(), t0(), 3).unwrap();
            finish(&store, VerificationStage::Errored);
        }
        let err = store.begin(&session(), t0(), 3).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Core(IdvError::Validation(
                ValidationError::AttemptOutOfBudget {
                    attempt: 4,
                    max_attempts: 3
                }
            ))
        ));
    }

    #[test]
    fn update_unknown_session_errors() {
        let store = AttemptStore::new();
        let err = store.update(&session(), |_| ()).unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownSession { .. }));
        assert!(store.latest(&session()).is_none());
    }

    #[test]
    fn latest_reflects_updates() {
        let store = AttemptStore::new();
        store.begin(&session(), t0(), 3).unwrap();
        store
            .update(&session(), |a| {
                a.advance(VerificationStage::FaceComparison, t0()).unwrap()
            })
            .unwrap();
        assert_eq!(
            store.latest(&session()).unwrap().stage,
            VerificationStage::FaceComparison
        );
    }
}
