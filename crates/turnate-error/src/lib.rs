// ============================================================================
// Turnate Error - Application error type
// ============================================================================
//
// Every rejection produced by the admission pipeline (rate tiers, input
// screening, content-type validation, deadline, session authentication,
// role and resource authorization) is an `AppError`. Errors are recovered at
// the interceptor that detected them and rendered through `IntoResponse`.
//
// ============================================================================

use axum::{http::StatusCode, response::IntoResponse};
use serde_json::{Map, Value, json};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application error type
///
/// Covers the terminal conditions of the request pipeline plus the handful of
/// resource outcomes (not found, conflict) the channel operations need.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Authentication & Authorization =====
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[cfg(feature = "jwt")]
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ===== Admission =====
    #[error("{error}: {message}")]
    RateLimited {
        error: &'static str,
        message: &'static str,
    },

    #[error("{error} in field '{field}'")]
    InvalidInput {
        error: &'static str,
        message: &'static str,
        field: String,
    },

    #[error("Unsupported content type")]
    UnsupportedMediaType,

    #[error("Request timeout")]
    Timeout,

    // ===== Resources =====
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource conflict: {0}")]
    Conflict(String),

    // ===== Configuration & Internal =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            #[cfg(feature = "jwt")]
            AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidInput { .. } | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Config(_) | AppError::Internal(_) | AppError::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message (without sensitive details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthenticated(msg) => msg.clone(),
            #[cfg(feature = "jwt")]
            AppError::Jwt(_) => "Invalid token".to_string(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::RateLimited { error, .. } => error.to_string(),
            AppError::InvalidInput { error, .. } => error.to_string(),
            AppError::UnsupportedMediaType => "Unsupported content type".to_string(),
            AppError::Timeout => "Request timeout".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Longer explanation attached as `message` in the rejection body
    pub fn detail(&self) -> Option<&'static str> {
        match self {
            AppError::RateLimited { message, .. } => Some(*message),
            AppError::InvalidInput { message, .. } => Some(*message),
            AppError::UnsupportedMediaType => {
                Some("Expected application/json or multipart/form-data")
            }
            AppError::Timeout => Some("The request took too long to process"),
            _ => None,
        }
    }

    /// Name of the offending request field, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            AppError::InvalidInput { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => "UNAUTHENTICATED",
            #[cfg(feature = "jwt")]
            AppError::Jwt(_) => "INVALID_TOKEN",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            AppError::InvalidInput { .. } => "INVALID_INPUT",
            AppError::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            AppError::Timeout => "REQUEST_TIMEOUT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Structured rejection body: `error`, `error_code`, and `message` / `field`
    /// where they apply. Server errors never carry internal details.
    pub fn body(&self) -> Value {
        let status = self.status_code();
        if status.is_server_error() {
            return json!({
                "error": "Internal server error",
                "error_code": self.error_code(),
            });
        }

        let mut body = Map::new();
        body.insert("error".into(), Value::String(self.user_message()));
        body.insert("error_code".into(), Value::String(self.error_code().into()));
        if let Some(message) = self.detail() {
            body.insert("message".into(), Value::String(message.into()));
        }
        if let Some(field) = self.field() {
            body.insert("field".into(), Value::String(field.into()));
        }
        Value::Object(body)
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                error = %self,
                error_code = %code,
                "Authentication failed"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Client error occurred"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();
        (self.status_code(), axum::Json(self.body())).into_response()
    }
}

// ============================================================================
// Helper functions for creating common errors
// ============================================================================

impl AppError {
    /// Create an authentication error (401)
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        AppError::Unauthenticated(msg.into())
    }

    /// Create an authorization error (403)
    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    /// Create a validation error (400)
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Create a not-found error (404)
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// Create a conflict error (409)
    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    /// Create an internal server error
    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }
}
