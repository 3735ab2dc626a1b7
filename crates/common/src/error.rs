//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to a machine-readable code and a process exit status:
/// - [`ServiceError::BadInput`] → `bad_input`, exit 65
/// - [`ServiceError::Rejected`] → `rejected`, exit 65
/// - [`ServiceError::Misconfigured`] → `misconfigured`, exit 78
/// - [`ServiceError::Internal`] → `internal_error`, exit 70
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The input record was malformed — not JSON, or not an object.
    #[error("bad input: {0}")]
    BadInput(String),

    /// The record failed verification and must be discarded, never treated as empty.
    #[error("record rejected: {0}")]
    Rejected(String),

    /// Key material or field rules are unusable. Retrying will not help.
    #[error("misconfigured: {0}")]
    Misconfigured(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the short machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadInput(_) => "bad_input",
            ServiceError::Rejected(_) => "rejected",
            ServiceError::Misconfigured(_) => "misconfigured",
            ServiceError::Internal(_) => "internal_error",
        }
    }

    /// Returns the process exit status (sysexits) that should be used for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceError::BadInput(_) => 65,
            ServiceError::Rejected(_) => 65,
            ServiceError::Misconfigured(_) => 78,
            ServiceError::Internal(_) => 70,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(ServiceError::BadInput("x".into()).exit_code(), 65);
        assert_eq!(ServiceError::Rejected("x".into()).exit_code(), 65);
        assert_eq!(ServiceError::Misconfigured("x".into()).exit_code(), 78);
        assert_eq!(ServiceError::Internal("x".into()).exit_code(), 70);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ServiceError::BadInput("x".into()).code(), "bad_input");
        assert_eq!(ServiceError::Rejected("x".into()).code(), "rejected");
        assert_eq!(
            ServiceError::Misconfigured("x".into()).code(),
            "misconfigured"
        );
        assert_eq!(ServiceError::Internal("x".into()).code(), "internal_error");
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::Rejected("envelope authentication failed".into());
        assert!(e.to_string().contains("envelope authentication failed"));
    }
}
