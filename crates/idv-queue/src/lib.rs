#![deny(missing_docs)]

//! # idv-queue — Review Queue Manager
//!
//! Holds verification sessions routed to human review. Guarantees that
//! each item is claimed by at most one reviewer at a time, decided exactly
//! once, and escalated (at most once) when it breaches its SLA deadline.
//!
//! ## Security Invariant
//!
//! Claim and decide are conditional writes executed under an exclusive
//! per-item lock: the status check and the mutation are atomic, so racing
//! reviewers observe either a clean win or a typed concurrency error —
//! never a silently shared claim or a second decision.
//!
//! The queue stores the priority the decision engine computed and never
//! recomputes it; a reviewer sees exactly the urgency the evidence
//! justified at decision time.

pub mod item;
pub mod queue;
pub mod sla;

pub use item::{ReviewItem, ReviewOutcome, ReviewStatus};
pub use queue::{ReviewDecision, ReviewQueue};
