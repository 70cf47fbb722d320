//! # SLA Escalation Scan
//!
//! A periodic sweep over the queue that flags items past their SLA
//! deadline. Escalation happens at most once per item (the flag is never
//! cleared, even if a reviewer later claims the item) and never touches
//! COMPLETED items. The scan returns the newly-escalated items so the
//! caller can emit audit events for them.

use chrono::{DateTime, Utc};

use idv_core::ReviewId;

use crate::item::{ReviewItem, ReviewStatus};
use crate::queue::ReviewQueue;

impl ReviewQueue {
    /// Escalate every overdue, not-yet-escalated, undecided item.
    ///
    /// Each item is re-checked under its exclusive shard lock before being
    /// flagged, so an item decided between the sweep and the write is left
    /// alone. Returns the items escalated by this call, oldest deadline
    /// first.
    pub fn escalate_overdue(&self, now: DateTime<Utc>) -> Vec<ReviewItem> {
        let candidates: Vec<ReviewId> = self
            .items()
            .iter()
            .filter(|entry| {
                entry.is_overdue(now)
                    && entry.escalated_at.is_none()
                    && !entry.status.is_terminal()
            })
            .map(|entry| entry.review_id)
            .collect();

        let mut escalated = Vec::new();
        for review_id in candidates {
            let Some(mut item) = self.items().get_mut(&review_id) else {
                continue;
            };
            // Re-check: the item may have been decided since the sweep.
            if item.status.is_terminal() || item.escalated_at.is_some() {
                continue;
            }
            item.status = ReviewStatus::Escalated;
            item.escalated_at = Some(now);
            tracing::warn!(
                review_id = %item.review_id,
                session_id = %item.session_id,
                priority = %item.priority,
                sla_deadline = %item.sla_deadline,
                "review item breached SLA, escalating"
            );
            escalated.push(item.clone());
        }
        escalated.sort_by(|a, b| a.sla_deadline.cmp(&b.sla_deadline));
        escalated
    }
}
