//! # Verification Configuration
//!
//! Explicit configuration structs for the decision engine, orchestrator, and
//! review queue. Constructed once at startup and passed into constructors —
//! nothing in the stack reads ambient environment state, which keeps the
//! decision engine pure and every component unit-testable with custom
//! thresholds.

use std::time::Duration;

use chrono::Duration as ChronoDuration;

// ---------------------------------------------------------------------------
// DecisionThresholds
// ---------------------------------------------------------------------------

/// Score thresholds for the decision engine.
///
/// Each score space is partitioned into three bands with no gap and no
/// overlap: PASS at `>= pass`, REVIEW at `>= review_floor` and `< pass`,
/// FAIL at `< review_floor`. Band edges are inclusive at the PASS boundary
/// and at the REVIEW lower boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionThresholds {
    /// Similarity at or above this is eligible for PASS.
    pub similarity_pass: f64,
    /// Similarity at or above this (and below `similarity_pass`) is REVIEW.
    pub similarity_review_floor: f64,
    /// Borderline similarity below this is HIGH severity, else MEDIUM.
    pub similarity_high_severity_below: f64,
    /// OCR confidence at or above this is eligible for PASS.
    pub ocr_pass: f64,
    /// OCR confidence at or above this (and below `ocr_pass`) is REVIEW.
    pub ocr_review_floor: f64,
    /// Borderline OCR confidence below this is HIGH severity, else MEDIUM.
    pub ocr_high_severity_below: f64,
    /// Liveness confidence below this contributes a borderline review
    /// signal. A failed liveness check is a hard fail regardless.
    pub liveness_min_confidence: f64,
    /// Age in years below which the document holder triggers field
    /// validation issues.
    pub minimum_age_years: u32,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            similarity_pass: 90.0,
            similarity_review_floor: 70.0,
            similarity_high_severity_below: 80.0,
            ocr_pass: 85.0,
            ocr_review_floor: 70.0,
            ocr_high_severity_below: 75.0,
            liveness_min_confidence: 90.0,
            minimum_age_years: 18,
        }
    }
}

// ---------------------------------------------------------------------------
// ImageQualityLimits
// ---------------------------------------------------------------------------

/// Acceptable bounds for document image quality metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageQualityLimits {
    /// Brightness below this is "too dark".
    pub brightness_min: f64,
    /// Brightness above this is "too bright".
    pub brightness_max: f64,
    /// Sharpness below this is "too blurry".
    pub sharpness_min: f64,
}

impl Default for ImageQualityLimits {
    fn default() -> Self {
        Self {
            brightness_min: 20.0,
            brightness_max: 240.0,
            sharpness_min: 30.0,
        }
    }
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Retry budget for transient evidence-adapter failures.
///
/// Delays double each attempt starting from `base_delay`. Retries apply only
/// to transient errors; permanent adapter errors are never retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retry attempts after the initial call.
    pub max_retries: u32,
    /// Base delay before the first retry (doubles each attempt).
    pub base_delay: Duration,
    /// Per-call timeout; exceeding it counts as a transient failure.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
            call_timeout: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// VerificationConfig
// ---------------------------------------------------------------------------

/// Complete configuration for one verification deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationConfig {
    /// Decision engine score thresholds.
    pub thresholds: DecisionThresholds,
    /// Image quality bounds.
    pub image_quality: ImageQualityLimits,
    /// Document fields that must be extracted with a non-empty value.
    pub required_fields: Vec<String>,
    /// SLA window for review items, from enqueue to expected decision.
    pub sla_window: ChronoDuration,
    /// Maximum verification attempts per session.
    pub max_attempts: u32,
    /// Retry budget for transient adapter failures.
    pub retry: RetryPolicy,
    /// Wall-clock budget for a whole attempt; exceeding it aborts the
    /// attempt as a workflow error.
    pub overall_timeout: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            thresholds: DecisionThresholds::default(),
            image_quality: ImageQualityLimits::default(),
            required_fields: vec![
                "full_name".to_string(),
                "date_of_birth".to_string(),
                "document_number".to_string(),
                "expiry_date".to_string(),
            ],
            sla_window: ChronoDuration::hours(24),
            max_attempts: 3,
            retry: RetryPolicy::default(),
            overall_timeout: Duration::from_secs(300),
        }
    }
}
