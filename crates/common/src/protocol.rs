//! Types exchanged between the batch processor and its callers.
//!
//! These types are serialised as single-line JSON inside the batch
//! processor's structured log records.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Structured description of a rejected input line.
///
/// Never carries plaintext, envelope text, or key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"rejected"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
    /// 1-based input line number the error refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line: None,
        }
    }

    /// Attach the input line number.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl From<&ServiceError> for ErrorResponse {
    fn from(e: &ServiceError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Batch summary
// ---------------------------------------------------------------------------

/// Totals reported at the end of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Lines successfully transformed and written to the output.
    pub processed: usize,
    /// Lines rejected and omitted from the output.
    pub rejected: usize,
}

impl BatchSummary {
    /// Returns `true` if no line was rejected.
    pub fn is_clean(&self) -> bool {
        self.rejected == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_new() {
        let e = ErrorResponse::new("rejected", "envelope authentication failed");
        assert_eq!(e.code, "rejected");
        assert!(e.line.is_none());
    }

    #[test]
    fn error_response_omits_missing_line() {
        let json = serde_json::to_string(&ErrorResponse::new("bad_input", "x")).unwrap();
        assert!(!json.contains("line"));
        let json =
            serde_json::to_string(&ErrorResponse::new("bad_input", "x").at_line(7)).unwrap();
        assert!(json.contains("\"line\":7"));
    }

    #[test]
    fn error_response_from_service_error() {
        let err = ServiceError::Misconfigured("bad key".into());
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.code, "misconfigured");
        assert!(resp.message.contains("bad key"));
    }

    #[test]
    fn batch_summary_serde() {
        let s = BatchSummary {
            processed: 3,
            rejected: 1,
        };
        let json = serde_json::to_string(&s).unwrap();
        let decoded: BatchSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, s);
        assert!(!decoded.is_clean());
        assert!(BatchSummary::default().is_clean());
    }
}
