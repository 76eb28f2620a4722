use std::fs;
use std::path::{Path, PathBuf};

use super::error::AuthError;
use super::token::Token;
use crate::util::write_private;

/// Storage abstraction for the session's OAuth token.
///
/// A session holds exactly one token, so the store has no keys: `load` yields
/// the initial token and `save` persists every replacement.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<Token>, AuthError>;
    fn save(&self, token: &Token) -> Result<(), AuthError>;
}

/// Inline token configuration, used when no token file exists yet.
#[derive(Debug, Clone)]
pub enum InlineToken {
    /// Raw JSON text, e.g. the contents of `INSIGHTER_CLIENT_TOKEN_JSON`.
    Json(String),
    /// An already-structured token; only normalization is applied.
    Structured(Token),
}

/// Configuration for [`FileTokenStore`].
#[derive(Debug, Clone, Default)]
pub struct TokenStoreConfig {
    pub path: Option<PathBuf>,
    pub inline: Option<InlineToken>,
}

impl TokenStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_inline_json(mut self, json: impl Into<String>) -> Self {
        self.inline = Some(InlineToken::Json(json.into()));
        self
    }

    pub fn with_inline_token(mut self, token: Token) -> Self {
        self.inline = Some(InlineToken::Structured(token));
        self
    }
}

/// File-backed token store with an optional inline seed.
///
/// # Example
/// ```no_run
/// use document_insighter::auth::{FileTokenStore, TokenStore, TokenStoreConfig};
///
/// let store = FileTokenStore::new(
///     TokenStoreConfig::new().with_path("/tmp/insighter/token.json"),
/// );
/// let token = store.load()?;
/// # Ok::<(), document_insighter::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    config: TokenStoreConfig,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> Option<&Path> {
        self.config.path.as_deref()
    }

    fn read_file(path: &Path) -> Result<Option<String>, AuthError> {
        match fs::read_to_string(path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Token>, AuthError> {
        if let Some(path) = self.config.path.as_deref() {
            if let Some(raw) = Self::read_file(path)? {
                tracing::debug!(path = %path.display(), "Loaded token file");
                return Token::from_json_str(&raw).map(Some);
            }
        }
        match &self.config.inline {
            Some(InlineToken::Json(raw)) => Token::from_json_str(raw).map(Some),
            Some(InlineToken::Structured(token)) => token.clone().normalized().map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, token: &Token) -> Result<(), AuthError> {
        let Some(path) = self.config.path.as_deref() else {
            return Ok(());
        };
        let serialized = serde_json::to_vec(token)?;
        write_private(path, &serialized)?;
        tracing::debug!(path = %path.display(), "Saved token file");
        Ok(())
    }
}
