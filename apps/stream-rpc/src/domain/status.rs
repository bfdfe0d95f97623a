//! Status Taxonomy
//!
//! Every failure a callee can produce is classified into exactly one
//! [`StatusCode`] before it crosses the call boundary. Callers only ever see
//! the code plus a human-readable message.

use std::fmt;

/// Terminal status of a logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// The call completed normally.
    Ok,
    /// The request carried a value the operation cannot accept.
    InvalidArgument,
    /// The addressed resource does not exist.
    NotFound,
    /// Store faults, task failures and unclassified transport errors.
    Internal,
    /// The caller's deadline elapsed before a terminal status was produced.
    DeadlineExceeded,
    /// One side abandoned the call.
    Canceled,
}

impl StatusCode {
    /// Stable lowercase label, used for metrics and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Canceled => "canceled",
        }
    }

    /// Whether a caller should treat this outcome as part of normal operation
    /// and carry on with its next call.
    #[must_use]
    pub const fn is_expected(self) -> bool {
        matches!(self, Self::Ok | Self::InvalidArgument | Self::NotFound)
    }

    /// Whether repeating the call (with a longer deadline) can succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified call failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// A request field failed validation.
    #[error("{message}")]
    InvalidArgument {
        /// Name of the offending request field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// The addressed resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Unclassified server-side failure.
    #[error("{0}")]
    Internal(String),

    /// The deadline elapsed.
    #[error("{0}")]
    DeadlineExceeded(String),

    /// The call was abandoned.
    #[error("{0}")]
    Canceled(String),
}

impl CallError {
    /// Build an `InvalidArgument` error for `field`.
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a `NotFound` error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Build an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The status code this error is reported with.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument { .. } => StatusCode::InvalidArgument,
            Self::NotFound(_) => StatusCode::NotFound,
            Self::Internal(_) => StatusCode::Internal,
            Self::DeadlineExceeded(_) => StatusCode::DeadlineExceeded,
            Self::Canceled(_) => StatusCode::Canceled,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(StatusCode::Ok, true, false)]
    #[test_case(StatusCode::InvalidArgument, true, false)]
    #[test_case(StatusCode::NotFound, true, false)]
    #[test_case(StatusCode::Internal, false, false)]
    #[test_case(StatusCode::DeadlineExceeded, false, true)]
    #[test_case(StatusCode::Canceled, false, false)]
    fn caller_policy(code: StatusCode, expected: bool, retryable: bool) {
        assert_eq!(code.is_expected(), expected);
        assert_eq!(code.is_retryable(), retryable);
    }

    #[test]
    fn error_codes() {
        assert_eq!(
            CallError::invalid_argument("number", "bad").code(),
            StatusCode::InvalidArgument
        );
        assert_eq!(CallError::not_found("x").code(), StatusCode::NotFound);
        assert_eq!(CallError::internal("x").code(), StatusCode::Internal);
        assert_eq!(
            CallError::DeadlineExceeded("late".into()).code(),
            StatusCode::DeadlineExceeded
        );
        assert_eq!(
            CallError::Canceled("gone".into()).code(),
            StatusCode::Canceled
        );
    }

    #[test]
    fn invalid_argument_displays_message_only() {
        let err = CallError::invalid_argument("number", "Received a negative number: -2");
        assert_eq!(err.to_string(), "Received a negative number: -2");
    }
}
