//! # Scripted Fake Adapters
//!
//! In-process stand-ins for the three evidence services, used by
//! orchestrator and integration tests. Each fake returns a configured
//! default response, optionally preceded by a script of queued results
//! (including failures) consumed in order — which makes retry and
//! gate-ordering paths testable without real services.
//!
//! Fakes record their call count so tests can assert that gates
//! short-circuit expensive calls (e.g. face comparison never runs after a
//! liveness hard fail).

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use idv_core::ImageRef;

use crate::adapter::{
    DocumentAnalysisRequest, DocumentAnalyzer, FaceCompareRequest, FaceComparator,
    LivenessCheckRequest, LivenessProvider,
};
use crate::error::AdapterError;
use crate::types::{
    DocumentEvidence, ExtractedField, ImageQuality, LivenessEvidence, SimilarityEvidence,
};

// ---------------------------------------------------------------------------
// Sample evidence builders
// ---------------------------------------------------------------------------

/// A clean document: all required fields present with the given OCR
/// confidence, not expired, one face, good image quality.
pub fn clean_document(ocr_confidence: f64) -> DocumentEvidence {
    let mut fields = BTreeMap::new();
    for (name, value) in [
        ("full_name", "Jane Example"),
        ("date_of_birth", "1990-04-12"),
        ("document_number", "P1234567"),
        ("expiry_date", "2031-01-01"),
    ] {
        fields.insert(
            name.to_string(),
            ExtractedField {
                value: value.to_string(),
                confidence: ocr_confidence,
            },
        );
    }
    DocumentEvidence {
        fields,
        is_expired: false,
        expiry_date: chrono::NaiveDate::from_ymd_opt(2031, 1, 1),
        faces_detected: 1,
        image_quality: Some(ImageQuality {
            brightness: 128.0,
            sharpness: 60.0,
            glare_detected: false,
            document_obscured: false,
        }),
    }
}

/// A passing liveness result with a reference image handle.
pub fn live_result(confidence: f64) -> LivenessEvidence {
    LivenessEvidence {
        is_live: true,
        confidence,
        reference_image: Some(ImageRef::new("fake/reference-image").expect("static handle")),
    }
}

/// A failed liveness result.
pub fn not_live_result() -> LivenessEvidence {
    LivenessEvidence {
        is_live: false,
        confidence: 35.0,
        reference_image: None,
    }
}

/// A similarity result with the given score and clean face crops.
pub fn similarity_result(similarity: f64) -> SimilarityEvidence {
    SimilarityEvidence {
        similarity,
        source_confidence: 99.0,
        target_confidence: 98.0,
        quality_issues: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Script plumbing shared by the three fakes
// ---------------------------------------------------------------------------

struct Script<T> {
    default_response: T,
    queued: Mutex<VecDeque<Result<T, AdapterError>>>,
    calls: AtomicU32,
    delay: Option<Duration>,
}

impl<T: Clone> Script<T> {
    fn new(default_response: T) -> Self {
        Self {
            default_response,
            queued: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
            delay: None,
        }
    }

    async fn next(&self) -> Result<T, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.queued.lock().pop_front() {
            Some(result) => result,
            None => Ok(self.default_response.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// FakeDocumentAnalyzer
// ---------------------------------------------------------------------------

/// Scripted fake for the document-analysis service.
pub struct FakeDocumentAnalyzer {
    script: Script<DocumentEvidence>,
}

impl FakeDocumentAnalyzer {
    /// Create a fake that returns `default_response` once any queued
    /// results are exhausted.
    pub fn returning(default_response: DocumentEvidence) -> Self {
        Self {
            script: Script::new(default_response),
        }
    }

    /// Queue a result (success or failure) to be returned before the
    /// default response. Queued results are consumed in order.
    pub fn push_result(&self, result: Result<DocumentEvidence, AdapterError>) {
        self.script.queued.lock().push_back(result);
    }

    /// Delay every call by `delay` (for timeout-path tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay = Some(delay);
        self
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> u32 {
        self.script.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentAnalyzer for FakeDocumentAnalyzer {
    async fn analyze(
        &self,
        _req: &DocumentAnalysisRequest,
    ) -> Result<DocumentEvidence, AdapterError> {
        self.script.next().await
    }
}

// ---------------------------------------------------------------------------
// FakeLivenessProvider
// ---------------------------------------------------------------------------

/// Scripted fake for the face-liveness service.
pub struct FakeLivenessProvider {
    script: Script<LivenessEvidence>,
}

impl FakeLivenessProvider {
    /// Create a fake that returns `default_response` once any queued
    /// results are exhausted.
    pub fn returning(default_response: LivenessEvidence) -> Self {
        Self {
            script: Script::new(default_response),
        }
    }

    /// Queue a result to be returned before the default response.
    pub fn push_result(&self, result: Result<LivenessEvidence, AdapterError>) {
        self.script.queued.lock().push_back(result);
    }

    /// Delay every call by `delay` (for timeout-path tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay = Some(delay);
        self
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> u32 {
        self.script.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LivenessProvider for FakeLivenessProvider {
    async fn liveness_result(
        &self,
        _req: &LivenessCheckRequest,
    ) -> Result<LivenessEvidence, AdapterError> {
        self.script.next().await
    }
}

// ---------------------------------------------------------------------------
// FakeFaceComparator
// ---------------------------------------------------------------------------

/// Scripted fake for the face-comparison service.
pub struct FakeFaceComparator {
    script: Script<SimilarityEvidence>,
}

impl FakeFaceComparator {
    /// Create a fake that returns `default_response` once any queued
    /// results are exhausted.
    pub fn returning(default_response: SimilarityEvidence) -> Self {
        Self {
            script: Script::new(default_response),
        }
    }

    /// Queue a result to be returned before the default response.
    pub fn push_result(&self, result: Result<SimilarityEvidence, AdapterError>) {
        self.script.queued.lock().push_back(result);
    }

    /// Delay every call by `delay` (for timeout-path tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay = Some(delay);
        self
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> u32 {
        self.script.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FaceComparator for FakeFaceComparator {
    async fn compare(&self, _req: &FaceCompareRequest) -> Result<SimilarityEvidence, AdapterError> {
        self.script.next().await
    }
}
