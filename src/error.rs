//! Error types for Starling
//!
//! All fallible operations return `AppError`. Each variant maps to a stable
//! label used by the errors metric.

use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Entity not found on the server (404)
    #[error("Resource not found")]
    NotFound,

    /// Access token rejected (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Input rejected before any network attempt
    #[error("Validation error: {0}")]
    Validation(String),

    /// A view section could not be loaded
    #[error("Failed to fetch {section}: {message}")]
    Fetch {
        section: &'static str,
        message: String,
    },

    /// Posting a status failed; the composer keeps its content
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Non-success response returned by the server
    #[error("Server responded with {status}: {body}")]
    Api { status: u16, body: String },

    /// HTTP transport error
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Protocol flavor or feature not supported by this client
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable label for metrics and structured logs
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Validation(_) => "validation",
            AppError::Fetch { .. } => "fetch",
            AppError::Submission(_) => "submission",
            AppError::Api { .. } => "api",
            AppError::HttpClient(_) => "http_client",
            AppError::Decode(_) => "decode",
            AppError::Config(_) => "config",
            AppError::NotImplemented(_) => "not_implemented",
            AppError::Internal(_) => "internal",
        }
    }

    /// Wrap a collaborator failure as a fetch error for one view section.
    ///
    /// Validation errors pass through untouched.
    pub fn into_fetch(self, section: &'static str) -> Self {
        match self {
            AppError::Fetch { .. } | AppError::Validation(_) => self,
            other => AppError::Fetch {
                section,
                message: other.to_string(),
            },
        }
    }

    /// Record this error in the errors metric
    pub fn record(&self, operation: &str) {
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL
            .with_label_values(&[self.error_type(), operation])
            .inc();
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
