#![deny(missing_docs)]

//! # idv-core — Foundational Types for the Verity IDV Stack
//!
//! This crate defines the foundational types that every other crate in the
//! workspace depends on. It has no internal crate dependencies — only `serde`,
//! `serde_json`, `thiserror`, `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`ReviewId`] where a [`SessionId`]
//!    is expected.
//!
//! 2. **Explicit configuration.** Decision thresholds, SLA windows, retry
//!    budgets, and attempt budgets travel in [`VerificationConfig`], passed
//!    into constructors. Nothing reads ambient environment state, which keeps
//!    the decision engine pure and unit-testable.
//!
//! 3. **[`IdvError`] hierarchy.** Structured errors with `thiserror` — no
//!    `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod identity;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{DecisionThresholds, ImageQualityLimits, RetryPolicy, VerificationConfig};
pub use error::{ConcurrencyError, IdvError, StateTransitionError, ValidationError};
pub use identity::{ImageRef, ReviewId, ReviewerId, SessionId};
