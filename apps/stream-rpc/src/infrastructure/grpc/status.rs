//! Status Mapping
//!
//! Converts between the domain's [`CallError`] and `tonic::Status`.
//! `InvalidArgument` carries a `BadRequest` field violation naming the
//! offending request field.

use tonic::{Code, Status};
use tonic_types::{ErrorDetails, StatusExt};

use crate::domain::status::{CallError, StatusCode};

impl From<CallError> for Status {
    fn from(err: CallError) -> Self {
        match err {
            CallError::InvalidArgument { field, message } => Self::with_error_details(
                Code::InvalidArgument,
                message.clone(),
                ErrorDetails::with_bad_request_violation(field, message),
            ),
            CallError::NotFound(message) => Self::not_found(message),
            CallError::Internal(message) => Self::internal(message),
            CallError::DeadlineExceeded(message) => Self::deadline_exceeded(message),
            CallError::Canceled(message) => Self::cancelled(message),
        }
    }
}

impl From<Status> for CallError {
    fn from(status: Status) -> Self {
        let message = status.message().to_string();
        match status.code() {
            Code::InvalidArgument => {
                let field = status
                    .get_details_bad_request()
                    .and_then(|bad| bad.field_violations.into_iter().next())
                    .map(|violation| violation.field)
                    .unwrap_or_default();
                Self::InvalidArgument { field, message }
            }
            Code::NotFound => Self::NotFound(message),
            Code::DeadlineExceeded => Self::DeadlineExceeded(message),
            Code::Cancelled => Self::Canceled(message),
            code => Self::Internal(format!("{code:?}: {message}")),
        }
    }
}

/// Classify a raw transport code.
#[must_use]
pub const fn classify(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::Ok,
        Code::InvalidArgument => StatusCode::InvalidArgument,
        Code::NotFound => StatusCode::NotFound,
        Code::DeadlineExceeded => StatusCode::DeadlineExceeded,
        Code::Cancelled => StatusCode::Canceled,
        _ => StatusCode::Internal,
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(CallError::not_found("x"), Code::NotFound)]
    #[test_case(CallError::internal("x"), Code::Internal)]
    #[test_case(CallError::DeadlineExceeded("x".into()), Code::DeadlineExceeded)]
    #[test_case(CallError::Canceled("x".into()), Code::Cancelled)]
    #[test_case(CallError::invalid_argument("n", "x"), Code::InvalidArgument)]
    fn error_to_status(err: CallError, code: Code) {
        let status = Status::from(err);
        assert_eq!(status.code(), code);
        assert_eq!(status.message(), "x");
    }

    #[test]
    fn invalid_argument_round_trips_field() {
        let status = Status::from(CallError::invalid_argument("blog_id", "Cannot parse ID"));
        let bad = status.get_details_bad_request().unwrap();
        assert_eq!(bad.field_violations[0].field, "blog_id");

        let back = CallError::from(status);
        assert_eq!(back, CallError::invalid_argument("blog_id", "Cannot parse ID"));
    }

    #[test_case(Code::Unavailable)]
    #[test_case(Code::Unknown)]
    #[test_case(Code::PermissionDenied)]
    fn unclassified_codes_are_internal(code: Code) {
        let err = CallError::from(Status::new(code, "boom"));
        assert_eq!(err.code(), StatusCode::Internal);
        assert_eq!(classify(code), StatusCode::Internal);
    }
}
