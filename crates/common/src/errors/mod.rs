//! Error types for Compras services
//!
//! Provides:
//! - Distinct error kinds for validation, configuration and upstream failures
//! - HTTP status code mapping
//! - The `{"erro": ...}` response body used by the question endpoint

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse error classification, used for logging and metrics labels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request itself is unusable (empty question, oversized input)
    Validation,
    /// Process configuration is incomplete (missing credential)
    Configuration,
    /// The answer service failed or returned something unusable
    Upstream,
    /// Anything else: file I/O, CSV parsing, malformed request bodies
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("{message}")]
    Validation { message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // Upstream (answer service) errors
    #[error("Answer service error: {message}")]
    Upstream { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Spreadsheet error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Shorthand for the empty-question rejection
    pub fn empty_question() -> Self {
        AppError::Validation {
            message: "Pergunta vazia".to_string(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation { .. } => ErrorKind::Validation,
            AppError::Configuration { .. } => ErrorKind::Configuration,
            AppError::Upstream { .. } |
            AppError::HttpClient(_) => ErrorKind::Upstream,
            AppError::Csv(_) |
            AppError::Io(_) |
            AppError::MalformedRequest { .. } |
            AppError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Configuration |
            ErrorKind::Upstream |
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Error body returned to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub erro: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                kind = kind.as_str(),
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                kind = kind.as_str(),
                status = status.as_u16(),
                "Client error"
            );
        }

        (status, Json(ErrorResponse { erro: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_question_is_bad_request() {
        let err = AppError::empty_question();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Pergunta vazia");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_configuration_error() {
        let err = AppError::Configuration {
            message: "API key nao configurada".into()
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Configuration error"));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_io_errors_are_internal() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "planilha.csv").into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_error() {
        let err = AppError::Upstream {
            message: "status 529".into()
        };
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
