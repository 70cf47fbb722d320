//! # Evidence Data Model
//!
//! The scored and boolean signals produced by external analysis services
//! and consumed by the decision engine. All scores live on a 0-100 scale
//! and are validated at construction time; the decision engine can then
//! treat every reachable input combination as decidable.
//!
//! Field maps use `BTreeMap` so that iteration order — and therefore the
//! order of accumulated review reasons — is deterministic.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use idv_core::{ImageRef, ValidationError};

fn check_score(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !(0.0..=100.0).contains(&value) || value.is_nan() {
        return Err(ValidationError::ScoreOutOfRange { field, value });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// ExtractedField
// ---------------------------------------------------------------------------

/// A single field extracted from a document image by the OCR service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    /// The extracted text value. May be empty when extraction failed.
    pub value: String,
    /// Extraction confidence, 0-100.
    pub confidence: f64,
}

impl ExtractedField {
    /// Create an extracted field, validating the confidence score.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ScoreOutOfRange`] if the confidence is
    /// outside 0-100.
    pub fn new(value: impl Into<String>, confidence: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            value: value.into(),
            confidence: check_score("field_confidence", confidence)?,
        })
    }

    /// Whether the field carries a usable value.
    pub fn is_present(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// ImageQuality
// ---------------------------------------------------------------------------

/// Image-quality metrics for the document image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageQuality {
    /// Mean brightness, 0 (black) to 255 (white).
    pub brightness: f64,
    /// Sharpness metric; higher is sharper.
    pub sharpness: f64,
    /// Whether significant glare was detected.
    pub glare_detected: bool,
    /// Whether part of the document appears obscured.
    pub document_obscured: bool,
}

// ---------------------------------------------------------------------------
// DocumentEvidence
// ---------------------------------------------------------------------------

/// Output of the document-analysis service for one document image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEvidence {
    /// Extracted fields keyed by field name (deterministic iteration order).
    pub fields: BTreeMap<String, ExtractedField>,
    /// Whether the document is past its expiry date.
    pub is_expired: bool,
    /// Parsed expiry date, when the service could extract one.
    pub expiry_date: Option<NaiveDate>,
    /// Number of faces detected in the document image.
    pub faces_detected: u32,
    /// Image-quality metrics, when the service produced them.
    pub image_quality: Option<ImageQuality>,
}

impl DocumentEvidence {
    /// Mean OCR confidence across all extracted fields, 0-100.
    ///
    /// An empty field map yields 0.0 — no extraction is treated as no
    /// confidence, which routes through the OCR hard-fail gate rather
    /// than silently passing.
    pub fn ocr_confidence(&self) -> f64 {
        if self.fields.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.fields.values().map(|f| f.confidence).sum();
        sum / self.fields.len() as f64
    }

    /// Names of required fields that are missing or empty.
    pub fn missing_fields(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.fields.get(*name).is_some_and(ExtractedField::is_present))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// LivenessEvidence
// ---------------------------------------------------------------------------

/// Output of the face-liveness service for one liveness session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessEvidence {
    /// Whether the liveness proof succeeded.
    pub is_live: bool,
    /// Liveness confidence, 0-100.
    pub confidence: f64,
    /// Reference image captured during the liveness session, used as the
    /// target of the face comparison.
    pub reference_image: Option<ImageRef>,
}

impl LivenessEvidence {
    /// Create liveness evidence, validating the confidence score.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ScoreOutOfRange`] if the confidence is
    /// outside 0-100.
    pub fn new(
        is_live: bool,
        confidence: f64,
        reference_image: Option<ImageRef>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            is_live,
            confidence: check_score("liveness_confidence", confidence)?,
            reference_image,
        })
    }
}

// ---------------------------------------------------------------------------
// SimilarityEvidence
// ---------------------------------------------------------------------------

/// Output of the face-comparison service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEvidence {
    /// Similarity between the document face and the liveness reference
    /// face, 0-100.
    pub similarity: f64,
    /// Detection confidence for the document face, 0-100.
    pub source_confidence: f64,
    /// Detection confidence for the reference face, 0-100.
    pub target_confidence: f64,
    /// Service-reported quality issues with either face crop.
    pub quality_issues: Vec<String>,
}

impl SimilarityEvidence {
    /// Create similarity evidence, validating all scores.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ScoreOutOfRange`] if any score is
    /// outside 0-100.
    pub fn new(
        similarity: f64,
        source_confidence: f64,
        target_confidence: f64,
        quality_issues: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            similarity: check_score("similarity", similarity)?,
            source_confidence: check_score("source_confidence", source_confidence)?,
            target_confidence: check_score("target_confidence", target_confidence)?,
            quality_issues,
        })
    }
}

// ---------------------------------------------------------------------------
// EvidenceBundle
// ---------------------------------------------------------------------------

/// The complete evidence set for one verification attempt, assembled by the
/// orchestrator and handed to the decision engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    /// Document-analysis output.
    pub document: DocumentEvidence,
    /// Liveness output.
    pub liveness: LivenessEvidence,
    /// Face-similarity output.
    pub similarity: SimilarityEvidence,
}
