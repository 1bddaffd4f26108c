/// Error Handling Module
///
/// One application error type for every flow in the service:
/// 1. Domain-specific error enums (validation, auth, storage, config)
/// 2. The unified `AppError` used for control flow
/// 3. HTTP response mapping with fixed, client-facing reason codes
/// 4. Structured error logging

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::auth::TokenError;
use crate::auth::PASSWORD_INCORRECT;
use crate::user::Role;

// ============================================================================
// 1. DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Validation errors for request input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(String),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(String, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(String, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(String),
    #[error("{0} contains suspicious content")]
    SuspiciousContent(String),
    #[error("password must contain at least one digit, one lowercase letter, and one uppercase letter")]
    WeakPassword,
    #[error("request body is invalid: {0}")]
    InvalidBody(String),
}

/// Columns that carry a uniqueness constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Phone,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Email => f.write_str("email"),
            UniqueField::Phone => f.write_str("phone number"),
        }
    }
}

/// Failures reported by the persistence collaborator
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("duplicate {0}")]
    UniqueConstraintViolation(UniqueField),
    #[error("record not found")]
    NotFound,
    #[error("storage operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("storage connection error: {0}")]
    ConnectionPool(String),
    #[error("storage query error: {0}")]
    QueryExecution(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config: {0}")]
    MissingRequired(String),
    #[error("invalid config value: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing authentication token")]
    MissingToken,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{}", PASSWORD_INCORRECT)]
    PasswordIncorrect,
    #[error("refresh token has been superseded")]
    RefreshTokenSuperseded,
}

// ============================================================================
// 2. UNIFIED APPLICATION ERROR TYPE
// ============================================================================

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} already exists")]
    Conflict(UniqueField),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{required} role required")]
    Forbidden { required: Role },
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Storage(StorageError),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UniqueConstraintViolation(field) => AppError::Conflict(field),
            StorageError::NotFound => AppError::NotFound,
            other => AppError::Storage(other),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Auth(AuthError::Token(err))
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(format!("blocking task failed: {}", err))
    }
}

impl AppError {
    /// Fixed reason code clients can match on
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(UniqueField::Email) => "EMAIL_EXISTS",
            AppError::Conflict(UniqueField::Phone) => "PHONE_EXISTS",
            AppError::Auth(e) => match e {
                AuthError::MissingToken => "MISSING_TOKEN",
                AuthError::Token(t) => t.code(),
                AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
                AuthError::PasswordIncorrect => "PASSWORD_INCORRECT",
                AuthError::RefreshTokenSuperseded => "REFRESH_TOKEN_SUPERSEDED",
            },
            AppError::Forbidden { .. } => "INSUFFICIENT_ROLE",
            AppError::NotFound => "USER_NOT_FOUND",
            AppError::Storage(StorageError::Timeout(_)) => "STORAGE_TIMEOUT",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Signing(_) => "SIGNING_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to clients. Server-side failures get a generic text.
    fn public_message(&self) -> String {
        match self {
            AppError::Storage(StorageError::Timeout(_)) => {
                "Storage did not respond in time, retry later".to_string()
            }
            AppError::Storage(_) => "Storage service error".to_string(),
            AppError::Signing(_) => "Token could not be issued".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response body
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Reason code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, error_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, error_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, error_id: &str) -> (StatusCode, ErrorResponse) {
        let status = self.status_code();
        let body = ErrorResponse::new(
            error_id.to_string(),
            self.public_message(),
            self.code().to_string(),
            status.as_u16(),
        );
        (status, body)
    }

    fn log_error(&self, error_id: &str) {
        let code = self.code();
        match self {
            AppError::Validation(_) | AppError::Conflict(_) | AppError::NotFound => {
                tracing::info!(error_id = error_id, code = code, error = %self, "Request rejected");
            }
            AppError::Auth(_) | AppError::Forbidden { .. } => {
                tracing::warn!(error_id = error_id, code = code, error = %self, "Access denied");
            }
            AppError::Storage(StorageError::Timeout(_)) => {
                tracing::warn!(error_id = error_id, code = code, error = %self, "Storage timeout");
            }
            AppError::Storage(_) => {
                tracing::error!(error_id = error_id, code = code, error = %self, "Storage error");
            }
            AppError::Signing(_) | AppError::Internal(_) => {
                tracing::error!(error_id = error_id, code = code, error = %self, "Server error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let (status, body) = <Self as ErrorHandler>::error_response(self, &error_id);
        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Storage(StorageError::Timeout(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(StorageError::ConnectionPool(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Signing(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn test_storage_conflict_becomes_conflict() {
        let err: AppError = StorageError::UniqueConstraintViolation(UniqueField::Phone).into();
        assert!(matches!(err, AppError::Conflict(UniqueField::Phone)));
        assert_eq!(err.code(), "PHONE_EXISTS");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "phone number already exists");
    }

    #[test]
    fn test_storage_timeout_is_retryable_503() {
        let err: AppError = StorageError::Timeout(Duration::from_secs(10)).into();
        assert_eq!(err.code(), "STORAGE_TIMEOUT");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_token_errors_are_unauthenticated_with_their_own_code() {
        let err: AppError = TokenError::Expired.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "TOKEN_EXPIRED");

        let err: AppError = TokenError::InvalidSignature.into();
        assert_eq!(err.code(), "INVALID_SIGNATURE");
    }

    #[test]
    fn test_password_incorrect_reason() {
        let err: AppError = AuthError::PasswordIncorrect.into();
        assert_eq!(err.to_string(), "password is incorrect");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_is_distinct_from_unauthenticated() {
        let err = AppError::Forbidden { required: Role::Admin };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "INSUFFICIENT_ROLE");
    }

    #[test]
    fn test_server_errors_do_not_leak_details() {
        let err = AppError::Storage(StorageError::QueryExecution(
            "relation \"users\" does not exist".to_string(),
        ));
        let (status, body) = <AppError as ErrorHandler>::error_response(&err, "id-1");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "STORAGE_ERROR");
        assert!(!body.message.contains("relation"));
        assert_eq!(body.error_id, "id-1");
    }

    #[test]
    fn test_signing_error_message_is_generic() {
        let err = AppError::Signing("InvalidKeyFormat".to_string());
        let (status, body) = <AppError as ErrorHandler>::error_response(&err, "id-2");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "SIGNING_ERROR");
        assert_eq!(body.message, "Token could not be issued");
    }
}
