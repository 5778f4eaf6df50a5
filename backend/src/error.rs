//! Error handling for the vinyl entry backend
//!
//! Errors carry a stable code so callers (the view layer, the CLI) can
//! branch on them without matching message text.

use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Serializable error detail for the view layer
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        let field = match self {
            AppError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };
        let message = match self {
            AppError::Validation { message, .. } => message.clone(),
            AppError::ExternalService(message) => message.clone(),
            AppError::Http(e) if e.is_timeout() => "The inventory service timed out".to_string(),
            other => other.to_string(),
        };
        ErrorDetail {
            code: self.code().to_string(),
            message,
            field,
        }
    }
}

/// Result type alias for backend operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_detail_keeps_field() {
        let err = AppError::Validation {
            field: "length_yards".to_string(),
            message: "Length must be positive".to_string(),
        };
        let detail = err.detail();
        assert_eq!(detail.code, "VALIDATION_ERROR");
        assert_eq!(detail.field.as_deref(), Some("length_yards"));
        assert_eq!(detail.message, "Length must be positive");
    }

    #[test]
    fn test_external_service_detail_is_bare_message() {
        let err = AppError::ExternalService("HTTP 500: boom".to_string());
        assert_eq!(err.detail().message, "HTTP 500: boom");
        assert_eq!(err.to_string(), "External service error: HTTP 500: boom");
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::NotFound("Row".to_string());
        assert_eq!(err.to_string(), "Resource not found: Row");
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
