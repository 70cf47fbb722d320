//! # Adapter Contracts
//!
//! Request types and async traits for the three external evidence
//! services. Both requests and responses are JSON-serializable so the
//! contracts double as the wire format for out-of-process adapters.
//!
//! Implementations must be idempotent or side-effect-tolerant under
//! abandonment: the orchestrator fires calls with a timeout and abandons
//! in-flight futures when the overall attempt budget expires.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use idv_core::ImageRef;

use crate::error::AdapterError;
use crate::types::{DocumentEvidence, LivenessEvidence, SimilarityEvidence};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Request to the document-analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysisRequest {
    /// Front image of the identity document.
    pub document_image: ImageRef,
    /// Back image, when the document type has one.
    pub back_image: Option<ImageRef>,
}

/// Request to the face-liveness service for a completed liveness session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessCheckRequest {
    /// Handle of the liveness session to fetch results for.
    pub liveness_session: String,
}

/// Request to the face-comparison service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceCompareRequest {
    /// Document image containing the source face.
    pub document_image: ImageRef,
    /// Liveness reference image containing the target face.
    pub reference_image: ImageRef,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Client for the document OCR / field-extraction service.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Analyze a document image and extract fields, expiry, face count,
    /// and quality metrics.
    async fn analyze(&self, req: &DocumentAnalysisRequest)
        -> Result<DocumentEvidence, AdapterError>;
}

/// Client for the face-liveness service.
#[async_trait]
pub trait LivenessProvider: Send + Sync {
    /// Fetch the result of a completed liveness session.
    async fn liveness_result(
        &self,
        req: &LivenessCheckRequest,
    ) -> Result<LivenessEvidence, AdapterError>;
}

/// Client for the face-comparison service.
#[async_trait]
pub trait FaceComparator: Send + Sync {
    /// Compare the document face against the liveness reference face.
    async fn compare(&self, req: &FaceCompareRequest) -> Result<SimilarityEvidence, AdapterError>;
}
