#![deny(missing_docs)]

//! # idv-evidence — Evidence Model and Adapter Contracts
//!
//! Typed request/response contracts for the three external evidence
//! services (document analysis, face liveness, face comparison), the
//! evidence data model the decision engine consumes, and the adapter error
//! taxonomy that separates retryable transport failures from semantic
//! failures.
//!
//! Adapters are pure I/O wrappers: no branching logic lives here. The
//! orchestrator owns retries, timeouts, and the mapping of permanent
//! adapter failures to verification outcomes.

pub mod adapter;
pub mod error;
pub mod fake;
pub mod types;

pub use adapter::{
    DocumentAnalysisRequest, DocumentAnalyzer, FaceCompareRequest, FaceComparator,
    LivenessCheckRequest, LivenessProvider,
};
pub use error::AdapterError;
pub use types::{
    DocumentEvidence, EvidenceBundle, ExtractedField, ImageQuality, LivenessEvidence,
    SimilarityEvidence,
};
