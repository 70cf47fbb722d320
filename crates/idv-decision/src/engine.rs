//! # Decision Engine
//!
//! Deterministic evaluation of a complete evidence bundle against
//! configured thresholds. Hard-fail gates run first (first match wins);
//! if none trips, every soft check runs and accumulates review reasons;
//! an empty reason set is a PASS, a non-empty one routes to review with
//! a priority derived from reason severities.
//!
//! ## Design
//!
//! The engine never reads the clock. Callers pass the evaluation instant
//! so that re-running the engine over the same bundle with the same
//! instant yields a byte-identical decision. Age computation and expiry
//! interpretation both hang off that instant.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use idv_core::VerificationConfig;
use idv_evidence::{DocumentEvidence, EvidenceBundle, LivenessEvidence, SimilarityEvidence};

use crate::reason::{
    HardFailCode, ReviewPriority, ReviewReason, ReviewReasonCode, Severity,
};

/// Date format expected in extracted `date_of_birth` fields.
const DOB_FORMAT: &str = "%Y-%m-%d";

/// Minimum alphanumeric length for a plausible document number.
const MIN_DOCUMENT_NUMBER_LEN: usize = 5;

// ---------------------------------------------------------------------------
// DecisionOutcome
// ---------------------------------------------------------------------------

/// The terminal classification of an evidence bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionOutcome {
    /// All checks passed; the session is verified automatically.
    Pass,
    /// A hard-fail condition tripped; the session is rejected.
    Fail,
    /// One or more soft signals require a human reviewer.
    Review,
}

impl DecisionOutcome {
    /// The canonical string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Review => "REVIEW",
        }
    }
}

impl std::fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DecisionMetadata
// ---------------------------------------------------------------------------

/// Scores and timing captured alongside the decision for audit records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionMetadata {
    /// Instant the evaluation ran against.
    pub evaluated_at: DateTime<Utc>,
    /// Face similarity score, when face comparison produced one.
    pub similarity: Option<f64>,
    /// Mean OCR confidence over extracted fields, when available.
    pub ocr_confidence: Option<f64>,
    /// Liveness confidence, when available.
    pub liveness_confidence: Option<f64>,
}

impl DecisionMetadata {
    /// Metadata with no scores, for decisions made before all evidence
    /// arrived (e.g. a gate tripping mid-pipeline).
    pub fn at(evaluated_at: DateTime<Utc>) -> Self {
        Self {
            evaluated_at,
            similarity: None,
            ocr_confidence: None,
            liveness_confidence: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// The output of one engine evaluation.
///
/// Invariants, enforced by the constructors: a FAIL carries exactly one
/// hard-fail code and no review reasons; a REVIEW carries at least one
/// reason and a priority; a PASS carries neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// The terminal classification.
    pub outcome: DecisionOutcome,
    /// The single code that forced a FAIL, if the outcome is FAIL.
    pub hard_fail: Option<HardFailCode>,
    /// Accumulated reasons, non-empty iff the outcome is REVIEW.
    pub review_reasons: Vec<ReviewReason>,
    /// Priority for the review queue, present iff the outcome is REVIEW.
    pub priority: Option<ReviewPriority>,
    /// Scores and timing captured for the audit record.
    pub metadata: DecisionMetadata,
}

impl Decision {
    /// A PASS decision.
    pub fn pass(metadata: DecisionMetadata) -> Self {
        Self {
            outcome: DecisionOutcome::Pass,
            hard_fail: None,
            review_reasons: Vec::new(),
            priority: None,
            metadata,
        }
    }

    /// A FAIL decision with its single hard-fail code.
    pub fn fail(code: HardFailCode, metadata: DecisionMetadata) -> Self {
        Self {
            outcome: DecisionOutcome::Fail,
            hard_fail: Some(code),
            review_reasons: Vec::new(),
            priority: None,
            metadata,
        }
    }

    /// A REVIEW decision. The priority is computed from the reason set
    /// here, once, and never recomputed downstream.
    ///
    /// An empty reason set degrades to PASS rather than producing a
    /// reasonless review item.
    pub fn review(reasons: Vec<ReviewReason>, metadata: DecisionMetadata) -> Self {
        if reasons.is_empty() {
            return Self::pass(metadata);
        }
        let priority = ReviewPriority::from_reasons(&reasons);
        Self {
            outcome: DecisionOutcome::Review,
            hard_fail: None,
            review_reasons: reasons,
            priority: Some(priority),
            metadata,
        }
    }

    /// Whether the outcome is PASS.
    pub fn is_pass(&self) -> bool {
        self.outcome == DecisionOutcome::Pass
    }

    /// Whether the outcome is FAIL.
    pub fn is_fail(&self) -> bool {
        self.outcome == DecisionOutcome::Fail
    }

    /// Whether the outcome is REVIEW.
    pub fn is_review(&self) -> bool {
        self.outcome == DecisionOutcome::Review
    }
}

// ---------------------------------------------------------------------------
// DecisionEngine
// ---------------------------------------------------------------------------

/// Pure evaluator mapping an evidence bundle to a [`Decision`].
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: VerificationConfig,
}

impl DecisionEngine {
    /// Build an engine over the given configuration.
    pub fn new(config: VerificationConfig) -> Self {
        Self { config }
    }

    /// The configuration this engine evaluates against.
    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Evaluate a complete evidence bundle at the given instant.
    ///
    /// Pure: same bundle, same instant, same configuration always produce
    /// the same decision.
    pub fn evaluate(&self, bundle: &EvidenceBundle, now: DateTime<Utc>) -> Decision {
        let metadata = DecisionMetadata {
            evaluated_at: now,
            similarity: Some(bundle.similarity.similarity),
            ocr_confidence: Some(bundle.document.ocr_confidence()),
            liveness_confidence: Some(bundle.liveness.confidence),
        };

        if let Some(code) = self.hard_fail(bundle) {
            return Decision::fail(code, metadata);
        }

        let mut reasons = Vec::new();
        self.check_similarity(&bundle.similarity, &mut reasons);
        self.check_ocr_confidence(&bundle.document, &mut reasons);
        self.check_liveness_confidence(&bundle.liveness, &mut reasons);
        self.check_image_quality(&bundle.document, &mut reasons);
        self.check_required_fields(&bundle.document, &mut reasons);
        self.check_field_validity(&bundle.document, now, &mut reasons);
        self.check_face_count(&bundle.document, &mut reasons);

        Decision::review(reasons, metadata)
    }

    // -----------------------------------------------------------------------
    // Hard-fail gates (first match wins)
    // -----------------------------------------------------------------------

    fn hard_fail(&self, bundle: &EvidenceBundle) -> Option<HardFailCode> {
        let t = &self.config.thresholds;
        if !bundle.liveness.is_live {
            return Some(HardFailCode::LivenessFailed);
        }
        if bundle.document.is_expired {
            return Some(HardFailCode::DocumentExpired);
        }
        if bundle.similarity.similarity < t.similarity_review_floor {
            return Some(HardFailCode::SimilarityBelowMinimum);
        }
        if bundle.document.ocr_confidence() < t.ocr_review_floor {
            return Some(HardFailCode::OcrConfidenceTooLow);
        }
        None
    }

    // -----------------------------------------------------------------------
    // Soft checks (all run, reasons accumulate in declaration order)
    // -----------------------------------------------------------------------

    fn check_similarity(&self, similarity: &SimilarityEvidence, reasons: &mut Vec<ReviewReason>) {
        let t = &self.config.thresholds;
        let score = similarity.similarity;
        if score >= t.similarity_review_floor && score < t.similarity_pass {
            let severity = if score < t.similarity_high_severity_below {
                Severity::High
            } else {
                Severity::Medium
            };
            reasons.push(ReviewReason::with_score(
                ReviewReasonCode::SimilarityBorderline,
                severity,
                score,
            ));
        }
    }

    fn check_ocr_confidence(&self, document: &DocumentEvidence, reasons: &mut Vec<ReviewReason>) {
        let t = &self.config.thresholds;
        let score = document.ocr_confidence();
        if score >= t.ocr_review_floor && score < t.ocr_pass {
            let severity = if score < t.ocr_high_severity_below {
                Severity::High
            } else {
                Severity::Medium
            };
            reasons.push(ReviewReason::with_score(
                ReviewReasonCode::OcrConfidenceBorderline,
                severity,
                score,
            ));
        }
    }

    fn check_liveness_confidence(
        &self,
        liveness: &LivenessEvidence,
        reasons: &mut Vec<ReviewReason>,
    ) {
        // Only reachable when is_live: a failed liveness already hard-failed.
        if liveness.confidence < self.config.thresholds.liveness_min_confidence {
            reasons.push(ReviewReason::with_score(
                ReviewReasonCode::LivenessConfidenceBorderline,
                Severity::Medium,
                liveness.confidence,
            ));
        }
    }

    fn check_image_quality(&self, document: &DocumentEvidence, reasons: &mut Vec<ReviewReason>) {
        // Absent metrics contribute nothing; only measured defects count.
        let Some(quality) = &document.image_quality else {
            return;
        };
        let limits = &self.config.image_quality;
        let failed = [
            quality.brightness < limits.brightness_min,
            quality.brightness > limits.brightness_max,
            quality.sharpness < limits.sharpness_min,
            quality.glare_detected,
            quality.document_obscured,
        ]
        .iter()
        .filter(|&&f| f)
        .count();
        if failed > 0 {
            let severity = if failed > 2 {
                Severity::High
            } else {
                Severity::Medium
            };
            reasons.push(ReviewReason::new(
                ReviewReasonCode::ImageQualityIssues,
                severity,
            ));
        }
    }

    fn check_required_fields(&self, document: &DocumentEvidence, reasons: &mut Vec<ReviewReason>) {
        if !document.missing_fields(&self.config.required_fields).is_empty() {
            reasons.push(ReviewReason::new(
                ReviewReasonCode::MissingRequiredFields,
                Severity::High,
            ));
        }
    }

    fn check_field_validity(
        &self,
        document: &DocumentEvidence,
        now: DateTime<Utc>,
        reasons: &mut Vec<ReviewReason>,
    ) {
        let mut invalid = false;

        if let Some(dob) = document.fields.get("date_of_birth") {
            match NaiveDate::parse_from_str(&dob.value, DOB_FORMAT) {
                Ok(date) => {
                    // None when the date is in the future, which is invalid too.
                    let age = now.date_naive().years_since(date).unwrap_or(0);
                    if age < self.config.thresholds.minimum_age_years {
                        invalid = true;
                    }
                }
                Err(_) => invalid = true,
            }
        }

        if let Some(number) = document.fields.get("document_number") {
            if suspicious_document_number(&number.value) {
                invalid = true;
            }
        }

        if invalid {
            reasons.push(ReviewReason::new(
                ReviewReasonCode::FieldValidationIssues,
                Severity::Medium,
            ));
        }
    }

    fn check_face_count(&self, document: &DocumentEvidence, reasons: &mut Vec<ReviewReason>) {
        if document.faces_detected > 1 {
            reasons.push(ReviewReason::new(
                ReviewReasonCode::MultipleFacesDetected,
                Severity::Medium,
            ));
        }
    }
}

/// Heuristic for obviously fabricated document numbers: too few
/// alphanumeric characters, a single repeated character, or a strictly
/// ascending digit run.
fn suspicious_document_number(value: &str) -> bool {
    let alnum: Vec<char> = value.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if alnum.len() < MIN_DOCUMENT_NUMBER_LEN {
        return true;
    }
    if alnum.iter().all(|&c| c == alnum[0]) {
        return true;
    }
    if alnum.iter().all(|c| c.is_ascii_digit()) {
        let ascending = alnum
            .windows(2)
            .all(|w| w[1] as i32 - w[0] as i32 == 1);
        if ascending {
            return true;
        }
    }
    false
}
