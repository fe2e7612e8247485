//! Error conversion at the HTTP boundary
//!
//! Data-layer and gateway errors become [`AppError`]s with stable codes.
//! Database and gateway text is logged here and replaced by a generic
//! message before it can reach a response body.

use crate::db::RepoError;
use crate::payment::GatewayError;
use shared::error::{AppError, ErrorCode};

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => AppError::not_found(what),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Constraint(msg) => {
                tracing::warn!(error = %msg, "Constraint violation");
                AppError::new(ErrorCode::ConstraintViolation)
            }
            RepoError::InvalidState(msg) => {
                AppError::with_message(ErrorCode::BookingInvalidTransition, msg)
            }
            RepoError::Consistency(msg) => AppError::with_message(ErrorCode::ConsistencyError, msg),
            RepoError::Schema(msg) => AppError::with_message(ErrorCode::SchemaError, msg),
            RepoError::Parse(msg) => {
                tracing::warn!(error = %msg, "Malformed backup");
                AppError::new(ErrorCode::BackupMalformed)
            }
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Io(e) => {
                tracing::error!(error = %e, "File operation failed");
                AppError::new(ErrorCode::FileStorageFailed)
            }
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        tracing::error!(error = %err, "Payment gateway call failed");
        match err {
            GatewayError::Unavailable(_) => AppError::new(ErrorCode::GatewayUnavailable),
            GatewayError::Rejected { status, .. } => {
                AppError::new(ErrorCode::GatewayRejected).with_detail("gateway_status", status)
            }
            GatewayError::InvalidResponse(_) => AppError::new(ErrorCode::PaymentFailed),
        }
    }
}

/// Convert a repository error, giving `NotFound` a resource-specific code
pub fn not_found_as(code: ErrorCode) -> impl Fn(RepoError) -> AppError {
    move |err| match err {
        RepoError::NotFound(what) => {
            AppError::with_message(code, format!("{} not found", capitalize(&what)))
        }
        other => other.into(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ApiResponse;

    #[test]
    fn test_constraint_message_is_generic() {
        let err: AppError = RepoError::Constraint("UNIQUE constraint failed: Users.email".into()).into();
        assert_eq!(err.code, ErrorCode::ConstraintViolation);
        assert!(!err.message.contains("Users.email"));
    }

    #[test]
    fn test_database_error_hidden_from_response() {
        let err: AppError = RepoError::Database("disk I/O error at page 7".into()).into();
        let body = ApiResponse::<()>::error(&err);
        assert_eq!(body.code, Some(9002));
        assert!(!body.message.contains("page 7"));
    }

    #[test]
    fn test_invalid_state_keeps_reason() {
        let err: AppError = RepoError::InvalidState("booking 3 cannot move from confirmed to in-cart".into()).into();
        assert_eq!(err.code, ErrorCode::BookingInvalidTransition);
        assert!(err.message.contains("booking 3"));
    }

    #[test]
    fn test_gateway_rejection_hides_body() {
        let err: AppError = GatewayError::Rejected {
            status: 422,
            body: "{\"name\":\"UNPROCESSABLE_ENTITY\",\"debug_id\":\"abc\"}".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::GatewayRejected);
        assert!(!err.message.contains("debug_id"));
    }

    #[test]
    fn test_not_found_as() {
        let err = not_found_as(ErrorCode::BookingNotFound)(RepoError::NotFound("booking 9".into()));
        assert_eq!(err.code, ErrorCode::BookingNotFound);
        assert_eq!(err.message, "Booking 9 not found");

        let err = not_found_as(ErrorCode::BookingNotFound)(RepoError::Validation("bad".into()));
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
