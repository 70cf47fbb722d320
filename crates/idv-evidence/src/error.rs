//! Evidence adapter error taxonomy.
//!
//! Separates failures the orchestrator may retry (transport errors,
//! timeouts, 5xx-class service errors) from semantic failures that are
//! terminal for the call (malformed input, no face detected). The
//! orchestrator maps [`AdapterError::NoFaceDetected`] to a dedicated
//! verification failure; every other permanent error escalates to a
//! workflow error.

use thiserror::Error;

/// Errors from evidence adapter calls.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The service failed transiently (connection failure, 5xx). Eligible
    /// for retry with backoff.
    #[error("transient failure calling {service}: {reason}")]
    Transient {
        /// The evidence service that failed.
        service: &'static str,
        /// Transport-level detail for diagnostics.
        reason: String,
    },

    /// The per-call timeout elapsed. Treated as transient.
    #[error("call to {service} timed out")]
    Timeout {
        /// The evidence service that timed out.
        service: &'static str,
    },

    /// No face could be detected in the supplied image. Permanent for
    /// this attempt; maps to a dedicated verification failure.
    #[error("no face detected by {service}")]
    NoFaceDetected {
        /// The evidence service that reported the condition.
        service: &'static str,
    },

    /// The service rejected the request semantically (malformed input,
    /// unsupported document). Permanent; never retried.
    #[error("permanent failure calling {service}: {reason}")]
    Permanent {
        /// The evidence service that failed.
        service: &'static str,
        /// Service-reported detail.
        reason: String,
    },
}

impl AdapterError {
    /// Whether this error is eligible for retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Timeout { .. })
    }

    /// The evidence service the error originated from.
    pub fn service(&self) -> &'static str {
        match self {
            Self::Transient { service, .. }
            | Self::Timeout { service }
            | Self::NoFaceDetected { service }
            | Self::Permanent { service, .. } => service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_and_timeout_are_retryable() {
        assert!(AdapterError::Transient {
            service: "document_analysis",
            reason: "503".to_string(),
        }
        .is_transient());
        assert!(AdapterError::Timeout {
            service: "face_compare",
        }
        .is_transient());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!AdapterError::NoFaceDetected {
            service: "face_compare",
        }
        .is_transient());
        assert!(!AdapterError::Permanent {
            service: "document_analysis",
            reason: "unsupported document type".to_string(),
        }
        .is_transient());
    }

    #[test]
    fn service_accessor_covers_all_variants() {
        let errors = [
            AdapterError::Transient {
                service: "liveness",
                reason: "x".to_string(),
            },
            AdapterError::Timeout { service: "liveness" },
            AdapterError::NoFaceDetected { service: "liveness" },
            AdapterError::Permanent {
                service: "liveness",
                reason: "x".to_string(),
            },
        ];
        for e in &errors {
            assert_eq!(e.service(), "liveness");
        }
    }

    #[test]
    fn display_carries_service_name() {
        let e = AdapterError::Timeout {
            service: "document_analysis",
        };
        assert!(format!("{e}").contains("document_analysis"));
    }
}
