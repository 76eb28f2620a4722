//! Error types for Document Insighter.

use std::time::Duration;

use thiserror::Error;

/// Primary error type for all client operations.
#[derive(Error, Debug)]
pub enum InsighterError {
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error(
        "Channel log with md5 hash {checksum} already exists for channel ids {channel_log_ids:?}"
    )]
    DuplicateDocument {
        checksum: String,
        channel_log_ids: Vec<String>,
    },

    #[error("HTTP error (status {status}) for {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Channel log {channel_log_id} did not finish within {}s", timeout.as_secs())]
    PollTimeout {
        channel_log_id: String,
        timeout: Duration,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InsighterError {
    /// Create an HTTP error from a non-success response.
    pub fn http(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether a caller-side retry policy may reasonably try again.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::PollTimeout { .. } => true,
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, InsighterError>;
