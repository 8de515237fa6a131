use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::otp::OtpError;
use crate::store::{StoreError, UniqueField};

/// Every failure a handler can return. Server-side variants keep their
/// source for logging; the response only carries a fixed message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{}", duplicate_message(.0))]
    Duplicate(UniqueField),
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid OTP")]
    InvalidCode,
    #[error("OTP expired")]
    CodeExpired,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("Note not found")]
    NoteNotFound,
    #[error("Failed to deliver OTP")]
    Delivery(#[source] anyhow::Error),
    #[error("Internal server error")]
    Storage(#[source] StoreError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

fn duplicate_message(field: &UniqueField) -> &'static str {
    match field {
        UniqueField::Username => "Username already exists",
        UniqueField::Email => "Email already exists",
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Duplicate(_)
            | ApiError::InvalidCode
            | ApiError::CodeExpired => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::UserNotFound | ApiError::NoteNotFound => StatusCode::NOT_FOUND,
            ApiError::Delivery(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Duplicate(_) => "duplicate_resource",
            ApiError::UserNotFound => "user_not_found",
            ApiError::InvalidCode => "invalid_code",
            ApiError::CodeExpired => "code_expired",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NoteNotFound => "note_not_found",
            ApiError::Delivery(_) => "delivery_error",
            ApiError::Storage(_) => "storage_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(field) => ApiError::Duplicate(field),
            other => ApiError::Storage(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection, "rejected request body");
        ApiError::Validation("Invalid request body")
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        warn!(error = %rejection, "rejected path parameter");
        ApiError::Validation("Invalid path parameter")
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::UserNotFound => ApiError::UserNotFound,
            OtpError::InvalidCode => ApiError::InvalidCode,
            OtpError::CodeExpired => ApiError::CodeExpired,
            OtpError::Storage(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Delivery(e) => error!(error = %e, "otp delivery failed"),
            ApiError::Storage(e) => error!(error = %e, "store failure"),
            ApiError::Internal(e) => error!(error = %e, "internal error"),
            _ => {}
        }
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_message_and_code() {
        let err = ApiError::from(StoreError::Conflict(UniqueField::Email));
        assert_eq!(err.to_string(), "Email already exists");
        assert_eq!(err.code(), "duplicate_resource");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn otp_errors_map_to_client_errors() {
        assert_eq!(ApiError::from(OtpError::InvalidCode).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(OtpError::CodeExpired).code(), "code_expired");
        assert_eq!(ApiError::from(OtpError::UserNotFound).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_detail_is_not_exposed() {
        let err = ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }
}
