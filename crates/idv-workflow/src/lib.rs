#![deny(missing_docs)]

//! # idv-workflow — Workflow Orchestrator
//!
//! Ties the stack together: runs verification attempts through parallel
//! evidence gathering, hard-fail gates, face comparison, and the decision
//! engine; routes REVIEW outcomes into the queue; and propagates reviewer
//! verdicts back to sessions.
//!
//! ## Security Invariant
//!
//! Face comparison never runs unless both the liveness proof and the
//! document validity gate have passed — the attempt's transition log
//! proves which path every session took.

pub mod attempt;
pub mod error;
pub mod orchestrator;
pub mod store;

mod retry;

pub use attempt::{
    StageTransition, VerificationAttempt, VerificationRequest, VerificationStage,
};
pub use error::WorkflowError;
pub use orchestrator::Orchestrator;
pub use store::AttemptStore;
