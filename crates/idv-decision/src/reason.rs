//! # Reason Codes, Severity, and Priority
//!
//! Fixed vocabularies for decision outcomes: hard-fail codes (exactly one
//! per FAIL), review reason codes (one or more per REVIEW), severity
//! assigned by fixed rule per code, and the review priority derived from
//! the accumulated reason set.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// HardFailCode
// ---------------------------------------------------------------------------

/// A condition that forces FAIL regardless of any other evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HardFailCode {
    /// The liveness proof did not succeed.
    LivenessFailed,
    /// The document is past its expiry date.
    DocumentExpired,
    /// Face similarity is below the FAIL threshold.
    SimilarityBelowMinimum,
    /// OCR confidence is below the FAIL threshold.
    OcrConfidenceTooLow,
    /// An evidence service found no face in the supplied image.
    NoFaceDetected,
}

impl HardFailCode {
    /// The canonical string code for serialization and audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LivenessFailed => "LIVENESS_FAILED",
            Self::DocumentExpired => "DOCUMENT_EXPIRED",
            Self::SimilarityBelowMinimum => "SIMILARITY_BELOW_MINIMUM",
            Self::OcrConfidenceTooLow => "OCR_CONFIDENCE_TOO_LOW",
            Self::NoFaceDetected => "NO_FACE_DETECTED",
        }
    }
}

impl std::fmt::Display for HardFailCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity of a review reason, assigned by fixed rule per code.
///
/// Variants are declared in ascending order so the derived `Ord` matches
/// the natural severity ordering (`Low < Medium < High`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational; rarely drives priority.
    Low,
    /// Default severity for borderline signals.
    Medium,
    /// Strong signal; forces HIGH review priority on its own.
    High,
}

impl Severity {
    /// The canonical string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReviewReasonCode
// ---------------------------------------------------------------------------

/// A condition that contributes to a REVIEW outcome without forcing FAIL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewReasonCode {
    /// Similarity landed in the REVIEW band.
    SimilarityBorderline,
    /// OCR confidence landed in the REVIEW band.
    OcrConfidenceBorderline,
    /// Liveness passed but with confidence below the configured minimum.
    LivenessConfidenceBorderline,
    /// One or more image-quality predicates failed.
    ImageQualityIssues,
    /// One or more required document fields are missing or empty.
    MissingRequiredFields,
    /// Field-level validation failed (bad date of birth, under-age holder,
    /// suspicious document number).
    FieldValidationIssues,
    /// More than one face was detected in the document image.
    MultipleFacesDetected,
}

impl ReviewReasonCode {
    /// The canonical string code for serialization and audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimilarityBorderline => "SIMILARITY_BORDERLINE",
            Self::OcrConfidenceBorderline => "OCR_CONFIDENCE_BORDERLINE",
            Self::LivenessConfidenceBorderline => "LIVENESS_CONFIDENCE_BORDERLINE",
            Self::ImageQualityIssues => "IMAGE_QUALITY_ISSUES",
            Self::MissingRequiredFields => "MISSING_REQUIRED_FIELDS",
            Self::FieldValidationIssues => "FIELD_VALIDATION_ISSUES",
            Self::MultipleFacesDetected => "MULTIPLE_FACES_DETECTED",
        }
    }
}

impl std::fmt::Display for ReviewReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReviewReason
// ---------------------------------------------------------------------------

/// A single accumulated review reason with its fixed-rule severity and,
/// where applicable, the score that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewReason {
    /// The reason code.
    pub code: ReviewReasonCode,
    /// Severity assigned by the fixed rule for this code.
    pub severity: Severity,
    /// The score that drove the reason, when one exists.
    pub related_score: Option<f64>,
}

impl ReviewReason {
    /// Create a reason with no related score.
    pub fn new(code: ReviewReasonCode, severity: Severity) -> Self {
        Self {
            code,
            severity,
            related_score: None,
        }
    }

    /// Create a reason carrying the score that triggered it.
    pub fn with_score(code: ReviewReasonCode, severity: Severity, score: f64) -> Self {
        Self {
            code,
            severity,
            related_score: Some(score),
        }
    }
}

// ---------------------------------------------------------------------------
// ReviewPriority
// ---------------------------------------------------------------------------

/// Priority of a review queue item, computed once from the reason set at
/// decision time and immutable thereafter.
///
/// Variants are declared in ascending order so the derived `Ord` matches
/// the natural ordering (`Low < Normal < High`), which the queue relies on
/// for priority-descending listings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewPriority {
    /// No MEDIUM or HIGH severity reasons.
    Low,
    /// Exactly one MEDIUM severity reason.
    Normal,
    /// Any HIGH severity reason, or two or more MEDIUM severity reasons.
    High,
}

impl ReviewPriority {
    /// Compute the priority for a reason set.
    ///
    /// HIGH if any reason has severity HIGH or at least two have severity
    /// MEDIUM; NORMAL if exactly one MEDIUM; LOW otherwise. Adding a HIGH
    /// severity reason to any set can therefore never lower the priority.
    pub fn from_reasons(reasons: &[ReviewReason]) -> Self {
        let highs = reasons
            .iter()
            .filter(|r| r.severity == Severity::High)
            .count();
        let mediums = reasons
            .iter()
            .filter(|r| r.severity == Severity::Medium)
            .count();
        if highs > 0 || mediums >= 2 {
            Self::High
        } else if mediums == 1 {
            Self::Normal
        } else {
            Self::Low
        }
    }

    /// The canonical string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for ReviewPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(severity: Severity) -> ReviewReason {
        ReviewReason::new(ReviewReasonCode::SimilarityBorderline, severity)
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn priority_ordering() {
        assert!(ReviewPriority::Low < ReviewPriority::Normal);
        assert!(ReviewPriority::Normal < ReviewPriority::High);
    }

    #[test]
    fn priority_empty_set_is_low() {
        assert_eq!(ReviewPriority::from_reasons(&[]), ReviewPriority::Low);
    }

    #[test]
    fn priority_single_medium_is_normal() {
        assert_eq!(
            ReviewPriority::from_reasons(&[reason(Severity::Medium)]),
            ReviewPriority::Normal
        );
    }

    #[test]
    fn priority_two_mediums_is_high() {
        assert_eq!(
            ReviewPriority::from_reasons(&[reason(Severity::Medium), reason(Severity::Medium)]),
            ReviewPriority::High
        );
    }

    #[test]
    fn priority_any_high_is_high() {
        assert_eq!(
            ReviewPriority::from_reasons(&[reason(Severity::High)]),
            ReviewPriority::High
        );
        assert_eq!(
            ReviewPriority::from_reasons(&[reason(Severity::Low), reason(Severity::High)]),
            ReviewPriority::High
        );
    }

    #[test]
    fn priority_only_lows_is_low() {
        assert_eq!(
            ReviewPriority::from_reasons(&[reason(Severity::Low), reason(Severity::Low)]),
            ReviewPriority::Low
        );
    }

    #[test]
    fn hard_fail_code_strings() {
        assert_eq!(HardFailCode::LivenessFailed.as_str(), "LIVENESS_FAILED");
        assert_eq!(HardFailCode::DocumentExpired.as_str(), "DOCUMENT_EXPIRED");
        assert_eq!(
            HardFailCode::SimilarityBelowMinimum.as_str(),
            "SIMILARITY_BELOW_MINIMUM"
        );
        assert_eq!(
            HardFailCode::OcrConfidenceTooLow.as_str(),
            "OCR_CONFIDENCE_TOO_LOW"
        );
        assert_eq!(HardFailCode::NoFaceDetected.as_str(), "NO_FACE_DETECTED");
    }

    #[test]
    fn review_reason_code_strings() {
        assert_eq!(
            ReviewReasonCode::SimilarityBorderline.as_str(),
            "SIMILARITY_BORDERLINE"
        );
        assert_eq!(
            ReviewReasonCode::OcrConfidenceBorderline.as_str(),
            "OCR_CONFIDENCE_BORDERLINE"
        );
        assert_eq!(
            ReviewReasonCode::LivenessConfidenceBorderline.as_str(),
            "LIVENESS_CONFIDENCE_BORDERLINE"
        );
        assert_eq!(
            ReviewReasonCode::ImageQualityIssues.as_str(),
            "IMAGE_QUALITY_ISSUES"
        );
        assert_eq!(
            ReviewReasonCode::MissingRequiredFields.as_str(),
            "MISSING_REQUIRED_FIELDS"
        );
        assert_eq!(
            ReviewReasonCode::FieldValidationIssues.as_str(),
            "FIELD_VALIDATION_ISSUES"
        );
        assert_eq!(
            ReviewReasonCode::MultipleFacesDetected.as_str(),
            "MULTIPLE_FACES_DETECTED"
        );
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(
            HardFailCode::LivenessFailed.to_string(),
            HardFailCode::LivenessFailed.as_str()
        );
        assert_eq!(Severity::High.to_string(), "HIGH");
        assert_eq!(ReviewPriority::Normal.to_string(), "NORMAL");
        assert_eq!(
            ReviewReasonCode::MultipleFacesDetected.to_string(),
            "MULTIPLE_FACES_DETECTED"
        );
    }

    #[test]
    fn reason_with_score_roundtrip() {
        let r = ReviewReason::with_score(
            ReviewReasonCode::SimilarityBorderline,
            Severity::High,
            78.5,
        );
        let json = serde_json::to_string(&r).unwrap();
        let back: ReviewReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
        assert_eq!(back.related_score, Some(78.5));
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&ReviewReasonCode::MissingRequiredFields).unwrap();
        assert_eq!(json, "\"MISSING_REQUIRED_FIELDS\"");
        let json = serde_json::to_string(&HardFailCode::OcrConfidenceTooLow).unwrap();
        assert_eq!(json, "\"OCR_CONFIDENCE_TOO_LOW\"");
        let json = serde_json::to_string(&ReviewPriority::High).unwrap();
        assert_eq!(json, "\"HIGH\"");
    }

    // Priority monotonicity: adding a HIGH severity reason never lowers
    // the computed priority.
    #[test]
    fn priority_monotone_under_high_addition() {
        let bases: Vec<Vec<ReviewReason>> = vec![
            vec![],
            vec![reason(Severity::Low)],
            vec![reason(Severity::Medium)],
            vec![reason(Severity::Medium), reason(Severity::Medium)],
            vec![reason(Severity::High)],
        ];
        for base in bases {
            let before = ReviewPriority::from_reasons(&base);
            let mut extended = base.clone();
            extended.push(reason(Severity::High));
            let after = ReviewPriority::from_reasons(&extended);
            assert!(after >= before, "priority dropped from {before} to {after}");
        }
    }
}
