//! Errors surfaced by article analysis. Every failure is fatal to the call
//! that produced it; nothing here is retried.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// Missing or invalid settings, detected before any request is sent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication rejected ({status}): {message}")]
    Authentication { status: StatusCode, message: String },

    #[error("Rate limited: {message}")]
    RateLimit { message: String },

    /// The remote response does not decode into the expected shape.
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

impl AnalyzeError {
    /// Classifies a non-success HTTP status.
    pub(crate) fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Self::Authentication { status, message }
            }
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimit { message },
            _ => Self::Api { status, message },
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
