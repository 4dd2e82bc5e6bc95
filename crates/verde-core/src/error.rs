//! Error types for Verde

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("AI service error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the failure came from the external AI service and may succeed
    /// if the caller tries again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Api { .. } | Error::InvalidData(_) | Error::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
