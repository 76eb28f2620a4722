#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use document_insighter::auth::{AuthError, AuthSession, GrantFlow, Token, TokenStore};
use document_insighter::client::DocumentInsighter;
use document_insighter::config::{Credentials, Environment};

pub const TOKEN_PATH: &str = "/oauth/token";

#[derive(Default)]
pub struct InMemoryTokenStore {
    token: Mutex<Option<Token>>,
    saves: AtomicUsize,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(token: Token) -> Self {
        let store = Self::default();
        *store.token.lock().expect("store lock poisoned") = Some(token);
        store
    }

    pub fn get(&self) -> Option<Token> {
        self.token.lock().expect("store lock poisoned").clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<Token>, AuthError> {
        Ok(self.get())
    }

    fn save(&self, token: &Token) -> Result<(), AuthError> {
        *self.token.lock().expect("store lock poisoned") = Some(token.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A token with no known expiry.
pub fn token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        ..Token::default()
    }
}

/// A token that expired an hour ago.
pub fn expired_token(access_token: &str, refresh_token: Option<&str>) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(String::from),
        expires_at: Some((chrono::Utc::now().timestamp() - 3600) as f64),
        ..Token::default()
    }
}

pub fn environment(server_uri: &str) -> Environment {
    Environment::custom(server_uri, format!("{server_uri}{TOKEN_PATH}"))
}

pub fn session(server_uri: &str, flow: GrantFlow, store: Arc<InMemoryTokenStore>) -> AuthSession {
    AuthSession::new(
        environment(server_uri),
        Credentials::new("client").with_secret("secret"),
        flow,
        store,
        Some("acme"),
    )
    .expect("session")
}

/// Service-account client against a mock server, polling fast.
pub fn client(server_uri: &str, store: Arc<InMemoryTokenStore>) -> DocumentInsighter {
    DocumentInsighter::new(session(server_uri, GrantFlow::ServiceAccount, store))
        .with_upgrade_next_links(false)
}
