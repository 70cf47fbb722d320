//! # Review Queue
//!
//! Concurrent in-memory queue of review items with atomic single-claim
//! assignment and decide-once semantics.
//!
//! ## Concurrency
//!
//! All conditional mutations (claim, decide, escalate) happen under the
//! exclusive shard lock returned by `DashMap::get_mut`: the status check
//! and the write are a single critical section, so two reviewers racing
//! for the same item can never both win.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use idv_core::{ConcurrencyError, IdvError, ReviewId, ReviewerId, SessionId};
use idv_decision::{ReviewPriority, ReviewReason};

use crate::item::{ReviewItem, ReviewOutcome, ReviewStatus};

// ---------------------------------------------------------------------------
// ReviewDecision
// ---------------------------------------------------------------------------

/// The record produced by a successful decision, handed back to the
/// orchestrator so it can propagate the verdict to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    /// The decided item.
    pub review_id: ReviewId,
    /// The session to propagate the verdict to.
    pub session_id: SessionId,
    /// The reviewer's verdict.
    pub outcome: ReviewOutcome,
    /// The reviewer who decided.
    pub decided_by: ReviewerId,
    /// Decision instant.
    pub decided_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ReviewQueue
// ---------------------------------------------------------------------------

/// Concurrent review queue with one open item per session.
#[derive(Debug, Default)]
pub struct ReviewQueue {
    items: DashMap<ReviewId, ReviewItem>,
    /// Sessions with a currently-open item. Entries are removed at
    /// decision time, so presence here means an open review exists.
    open_by_session: DashMap<SessionId, ReviewId>,
}

impl ReviewQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a new PENDING item for a session.
    ///
    /// # Errors
    ///
    /// Returns [`ConcurrencyError::DuplicateReview`] if the session already
    /// has an open (non-COMPLETED) item.
    pub fn enqueue(
        &self,
        session_id: SessionId,
        priority: ReviewPriority,
        reasons: Vec<ReviewReason>,
        now: DateTime<Utc>,
        sla_deadline: DateTime<Utc>,
    ) -> Result<ReviewItem, IdvError> {
        let item = ReviewItem::new(session_id.clone(), priority, reasons, now, sla_deadline);

        // The entry guard holds the shard lock across the open-item check
        // and the index write, making enqueue atomic per session.
        match self.open_by_session.entry(session_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                return Err(ConcurrencyError::DuplicateReview {
                    session_id: session_id.to_string(),
                    review_id: existing.get().to_string(),
                }
                .into());
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(item.review_id);
            }
        }
        self.items.insert(item.review_id, item.clone());
        tracing::info!(
            review_id = %item.review_id,
            session_id = %item.session_id,
            priority = %item.priority,
            "review item enqueued"
        );
        Ok(item)
    }

    /// Claim an item for a reviewer.
    ///
    /// A PENDING or ESCALATED item becomes IN_PROGRESS and is assigned to
    /// the caller. Re-claiming an item you already hold is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ConcurrencyError::AlreadyAssigned`] if another reviewer
    /// holds the item, or [`ConcurrencyError::AlreadyDecided`] if the item
    /// is COMPLETED.
    pub fn claim(
        &self,
        review_id: ReviewId,
        reviewer: &ReviewerId,
        now: DateTime<Utc>,
    ) -> Result<ReviewItem, IdvError> {
        let mut item = self
            .items
            .get_mut(&review_id)
            .ok_or_else(|| ConcurrencyError::NotAssigned {
                review_id: review_id.to_string(),
                reviewer_id: reviewer.to_string(),
            })?;

        match item.status {
            ReviewStatus::Completed => Err(ConcurrencyError::AlreadyDecided {
                review_id: review_id.to_string(),
            }
            .into()),
            ReviewStatus::InProgress => match &item.assigned_to {
                Some(holder) if holder == reviewer => Ok(item.clone()),
                Some(holder) => Err(ConcurrencyError::AlreadyAssigned {
                    review_id: review_id.to_string(),
                    assigned_to: holder.to_string(),
                }
                .into()),
                // IN_PROGRESS always has an assignee; treat a missing one
                // as a fresh claim rather than poisoning the item.
                None => {
                    item.assigned_to = Some(reviewer.clone());
                    item.claimed_at = Some(now);
                    Ok(item.clone())
                }
            },
            ReviewStatus::Pending | ReviewStatus::Escalated => {
                if let Some(holder) = &item.assigned_to {
                    if holder != reviewer {
                        return Err(ConcurrencyError::AlreadyAssigned {
                            review_id: review_id.to_string(),
                            assigned_to: holder.to_string(),
                        }
                        .into());
                    }
                }
                item.status = ReviewStatus::InProgress;
                item.assigned_to = Some(reviewer.clone());
                item.claimed_at = Some(now);
                Ok(item.clone())
            }
        }
    }

    /// Record the reviewer's verdict on an item they hold.
    ///
    /// The item becomes COMPLETED and its session is freed for future
    /// reviews. Exactly one decision is ever recorded per item.
    ///
    /// # Errors
    ///
    /// Returns [`ConcurrencyError::AlreadyDecided`] if a decision exists,
    /// or [`ConcurrencyError::NotAssigned`] if the caller does not hold
    /// the claim.
    pub fn decide(
        &self,
        review_id: ReviewId,
        reviewer: &ReviewerId,
        outcome: ReviewOutcome,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReviewDecision, IdvError> {
        let decision = {
            let mut item = self
                .items
                .get_mut(&review_id)
                .ok_or_else(|| ConcurrencyError::NotAssigned {
                    review_id: review_id.to_string(),
                    reviewer_id: reviewer.to_string(),
                })?;

            if item.status == ReviewStatus::Completed {
                return Err(ConcurrencyError::AlreadyDecided {
                    review_id: review_id.to_string(),
                }
                .into());
            }
            match &item.assigned_to {
                Some(holder) if holder == reviewer => {}
                _ => {
                    return Err(ConcurrencyError::NotAssigned {
                        review_id: review_id.to_string(),
                        reviewer_id: reviewer.to_string(),
                    }
                    .into());
                }
            }

            item.status = ReviewStatus::Completed;
            item.outcome = Some(outcome);
            item.decided_at = Some(now);
            item.notes = notes;
            ReviewDecision {
                review_id,
                session_id: item.session_id.clone(),
                outcome,
                decided_by: reviewer.clone(),
                decided_at: now,
            }
        };

        // Free the session for future attempts only after the item is
        // terminal; the open-index entry may belong to a newer item if a
        // stale handle is decided, so remove conditionally.
        self.open_by_session
            .remove_if(&decision.session_id, |_, open_id| *open_id == review_id);
        tracing::info!(
            review_id = %decision.review_id,
            session_id = %decision.session_id,
            outcome = %decision.outcome,
            decided_by = %decision.decided_by,
            "review decided"
        );
        Ok(decision)
    }

    /// Fetch a snapshot of an item.
    pub fn get(&self, review_id: ReviewId) -> Option<ReviewItem> {
        self.items.get(&review_id).map(|item| item.clone())
    }

    /// The open item for a session, if one exists.
    pub fn open_review_for(&self, session_id: &SessionId) -> Option<ReviewItem> {
        let review_id = *self.open_by_session.get(session_id)?;
        self.get(review_id)
    }

    /// List unclaimed open items in working order: priority descending,
    /// then oldest first. `offset`/`limit` paginate the sorted view.
    pub fn list_claimable(&self, offset: usize, limit: usize) -> Vec<ReviewItem> {
        let mut open: Vec<ReviewItem> = self
            .items
            .iter()
            .filter(|entry| entry.is_open() && entry.assigned_to.is_none())
            .map(|entry| entry.clone())
            .collect();
        open.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        open.into_iter().skip(offset).take(limit).collect()
    }

    /// List items in one lifecycle state, in the same working order as
    /// [`Self::list_claimable`].
    pub fn list_by_status(
        &self,
        status: ReviewStatus,
        offset: usize,
        limit: usize,
    ) -> Vec<ReviewItem> {
        let mut matching: Vec<ReviewItem> = self
            .items
            .iter()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.clone())
            .collect();
        matching.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        matching.into_iter().skip(offset).take(limit).collect()
    }

    /// Count of items per lifecycle state.
    pub fn status_counts(&self) -> BTreeMap<ReviewStatus, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.items.iter() {
            *counts.entry(entry.status).or_insert(0) += 1;
        }
        counts
    }

    /// Total number of items ever enqueued and still held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue holds no items at all.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn items(&self) -> &DashMap<ReviewId, ReviewItem> {
        &self.items
    }
}
