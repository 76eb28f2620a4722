use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// OAuth token payload as stored in a token file.
///
/// The layout matches what the identity provider returns from its token
/// endpoint plus an absolute `expires_at` (epoch seconds). Fields this crate
/// does not know about are kept in `extra` so a load/save cycle preserves them.
///
/// # Example
/// ```
/// use document_insighter::auth::Token;
///
/// let token = Token::from_json_str(r#"{"id_token": "eyJ.id", "refresh_token": "r"}"#)?;
/// assert_eq!(token.access_token, "eyJ.id");
/// # Ok::<(), document_insighter::auth::AuthError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Token {
    /// Parse and normalize a token from its JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, AuthError> {
        let token: Token = serde_json::from_str(raw)?;
        token.normalized()
    }

    /// Promote the identity token to the access token when the latter is absent.
    ///
    /// Fails when neither is present, since such a token can never
    /// authenticate a request.
    pub fn normalized(mut self) -> Result<Self, AuthError> {
        if self.access_token.is_empty() {
            match self.id_token.as_deref() {
                Some(id_token) if !id_token.is_empty() => {
                    self.access_token = id_token.to_string();
                }
                _ => {
                    return Err(AuthError::Parse(
                        "token has neither access_token nor id_token".to_string(),
                    ))
                }
            }
        }
        Ok(self)
    }

    /// Make the identity token the bearer when the response carries one.
    ///
    /// The service authenticates API calls by identity token, so a fresh
    /// grant's `access_token` is replaced whenever `id_token` is present.
    /// Tokens loaded from storage keep the weaker [`normalized`](Self::normalized)
    /// rule.
    pub fn with_identity_bearer(mut self) -> Self {
        if let Some(id_token) = self.id_token.as_deref().filter(|t| !t.is_empty()) {
            self.access_token = id_token.to_string();
        }
        self
    }

    /// Absolute expiry, if known.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        let secs = self.expires_at?;
        DateTime::<Utc>::from_timestamp_millis((secs * 1000.0) as i64)
    }

    /// Fill `expires_at` from `expires_in`, relative to `now`.
    pub fn stamp_expiry(&mut self, now: DateTime<Utc>) {
        if let Some(expires_in) = self.expires_in {
            self.expires_at = Some(now.timestamp() as f64 + expires_in as f64);
        }
    }

    /// Whether the access token is expired, or will be within `leeway`.
    ///
    /// Tokens without a known expiry never count as expired.
    pub fn is_expired(&self, now: DateTime<Utc>, leeway: chrono::Duration) -> bool {
        self.expires_at_utc()
            .map(|expires_at| expires_at <= now + leeway)
            .unwrap_or(false)
    }
}
