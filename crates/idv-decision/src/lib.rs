#![deny(missing_docs)]

//! # idv-decision — Pure Decision Engine
//!
//! Maps a complete evidence bundle to exactly one decision: PASS, FAIL, or
//! REVIEW. The engine is a pure function of its inputs and configuration —
//! no I/O, no clock access (the evaluation instant is a parameter), no
//! randomness. Determinism is the core testable property of the whole
//! verification system.
//!
//! ## Evaluation Order
//!
//! 1. **Hard-fail checks**, first match wins: failed liveness, expired
//!    document, similarity below the FAIL threshold, OCR confidence below
//!    the FAIL threshold. A hard fail short-circuits; borderline signals
//!    never override it.
//! 2. **Soft-fail accumulation**, all checks evaluated: borderline
//!    similarity, borderline OCR confidence, borderline liveness
//!    confidence, image-quality predicates, missing required fields,
//!    field-level validation, multiple faces.
//! 3. **Final decision**: a non-empty reason set routes to human review
//!    with a priority derived from reason severities; an empty set passes.

pub mod engine;
pub mod reason;

pub use engine::{Decision, DecisionEngine, DecisionMetadata, DecisionOutcome};
pub use reason::{HardFailCode, ReviewPriority, ReviewReason, ReviewReasonCode, Severity};
