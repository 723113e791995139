use std::collections::HashMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use ladle_db::StoreError;
use ladle_types::api::{ErrorDetail, ErrorEnvelope};

/// The error kinds surfaced by the services. Every variant maps to one
/// status code and one stable machine-readable code; the envelope shape is
/// `{success: false, error: {code, message, details?}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("this profile is private")]
    ProfilePrivate,

    #[error("access denied")]
    AccessDenied,

    #[error("username is already taken")]
    DuplicateUsername,

    #[error("users cannot follow themselves")]
    CannotFollowSelf,

    #[error("this user does not accept new followers")]
    FollowNotAllowed,

    #[error("invalid or expired deletion token")]
    InvalidToken,

    #[error("unknown preference category: {0}")]
    InvalidCategory(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("validation failed")]
    Validation(HashMap<String, String>),

    #[error("cache unavailable")]
    CacheUnavailable(#[from] redis::RedisError),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ProfilePrivate | ApiError::AccessDenied | ApiError::FollowNotAllowed => {
                StatusCode::FORBIDDEN
            }
            ApiError::DuplicateUsername => StatusCode::CONFLICT,
            ApiError::CannotFollowSelf
            | ApiError::InvalidToken
            | ApiError::InvalidCategory(_)
            | ApiError::BadRequest(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ProfilePrivate => "PROFILE_PRIVATE",
            ApiError::AccessDenied => "ACCESS_DENIED",
            ApiError::DuplicateUsername => "DUPLICATE_USERNAME",
            ApiError::CannotFollowSelf => "CANNOT_FOLLOW_SELF",
            ApiError::FollowNotAllowed => "FOLLOW_NOT_ALLOWED",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::InvalidCategory(_) => "INVALID_CATEGORY",
            ApiError::BadRequest(_) => "INVALID_REQUEST",
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::CacheUnavailable(_) => "CACHE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<HashMap<String, String>> {
        match self {
            ApiError::Validation(fields) => Some(fields.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                ApiError::Internal(e) => error!("internal error: {e:#}"),
                other => error!("request failed: {other}"),
            }
        }

        let body = ErrorEnvelope {
            success: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => ApiError::DuplicateUsername,
            StoreError::Database(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), message)
            })
            .collect();
        ApiError::Validation(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::NotFound("user").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::ProfilePrivate.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::DuplicateUsername.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::CannotFollowSelf.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::CacheUnavailable(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "down"
            )))
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn validation_errors_become_field_details() {
        let bad = ladle_types::api::UpdateProfileRequest {
            username: Some("not valid!".into()),
            ..Default::default()
        };
        let err: ApiError = bad.validate().unwrap_err().into();
        match err {
            ApiError::Validation(fields) => {
                assert!(fields.contains_key("username"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
