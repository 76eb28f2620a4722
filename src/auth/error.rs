use thiserror::Error;

use crate::error::InsighterError;

/// Normalized authentication errors across grant flows.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in: {0}")]
    NotLoggedIn(String),
    #[error("Expired or invalid grant: {0}")]
    ExpiredOrInvalidGrant(String),
    #[error("Authorization state mismatch")]
    StateMismatch,
    #[error("Authorization denied: {0}")]
    AccessDenied(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

impl From<AuthError> for InsighterError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NotLoggedIn(msg) => InsighterError::AuthenticationRequired(msg),
            AuthError::Parse(msg) => InsighterError::Parse(msg),
            other => InsighterError::Authentication(other.to_string()),
        }
    }
}
