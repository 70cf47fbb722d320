//! # Audit Sinks
//!
//! The sink contract is fire-and-forget: recording never fails from the
//! caller's point of view. A sink that cannot persist an event logs the
//! loss and moves on — audit problems must never block or fail a
//! verification.

use std::sync::Arc;

use parking_lot::Mutex;

use idv_core::SessionId;

use crate::event::{AuditEvent, AuditEventType};

// ---------------------------------------------------------------------------
// AuditSink
// ---------------------------------------------------------------------------

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    /// Record an event. Infallible by contract; implementations swallow
    /// and log their own persistence failures.
    fn record(&self, event: AuditEvent);
}

/// Sinks behind `Arc` are sinks too, so orchestrator and queue can share
/// one trail.
impl<S: AuditSink + ?Sized> AuditSink for Arc<S> {
    fn record(&self, event: AuditEvent) {
        (**self).record(event);
    }
}

// ---------------------------------------------------------------------------
// MemoryAuditSink
// ---------------------------------------------------------------------------

/// A bounded in-memory audit trail.
///
/// When the trail exceeds its capacity, the oldest 10% of events are
/// trimmed. In production deployments, events should be shipped to durable
/// storage before trimming.
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
    max_events: usize,
}

impl MemoryAuditSink {
    /// Create a trail with the given maximum capacity.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            max_events,
        }
    }

    /// Snapshot of all retained events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Retained events for one session, oldest first.
    pub fn events_for_session(&self, session_id: &SessionId) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.session_id.as_ref() == Some(session_id))
            .cloned()
            .collect()
    }

    /// Retained events of one type, oldest first.
    pub fn events_by_type(&self, event_type: AuditEventType) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// The last `n` retained events (all of them if fewer exist).
    pub fn last_n(&self, n: usize) -> Vec<AuditEvent> {
        let events = self.events.lock();
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Digests for all retained events, as `(index, hex)` pairs. Events
    /// that fail serialization are skipped.
    pub fn digests(&self) -> Vec<(usize, String)> {
        self.events
            .lock()
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.digest().map(|d| (i, d)))
            .collect()
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        events.push(event);
        if events.len() > self.max_events {
            let trim_count = (self.max_events / 10).max(1);
            tracing::warn!(
                trimmed = trim_count,
                capacity = self.max_events,
                "audit trail over capacity, trimming oldest events"
            );
            events.drain(..trim_count);
        }
    }
}

impl std::fmt::Debug for MemoryAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAuditSink")
            .field("events", &self.len())
            .field("max_events", &self.max_events)
            .finish()
    }
}
