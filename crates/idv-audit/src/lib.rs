#![deny(missing_docs)]

//! # idv-audit — Audit Emitter
//!
//! Structured audit records for every externally-visible action in the
//! verification stack, with a fire-and-forget sink contract and a bounded
//! in-memory trail for tests and single-process deployments.
//!
//! Events are PII-free by construction: identifiers, codes, and scores
//! only. Persistence failures are logged and swallowed — the audit path
//! never blocks or fails a verification.

pub mod event;
pub mod sink;

pub use event::{AuditActor, AuditEvent, AuditEventType, AuditResult};
pub use sink::{AuditSink, MemoryAuditSink};
