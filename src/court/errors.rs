//! Error types for the court search and download pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse search response for {date}: {message}")]
    Parse { date: String, message: String },

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScraperError {
    pub fn validation(message: impl Into<String>) -> Self {
        ScraperError::Validation(message.into())
    }

    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ScraperError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            ScraperError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Errors that must abort the whole run rather than a single record or day.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScraperError::Filesystem(_) | ScraperError::Validation(_) | ScraperError::Config(_)
        )
    }
}
