use std::sync::{Arc, Mutex};

use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, StatusCode};

use super::error::AuthError;
use super::flow::{AuthorizationRequest, GrantFlow, TokenStatus};
use super::store::{FileTokenStore, TokenStore};
use super::token::Token;
use crate::config::{ClientSettings, Credentials, Environment, FlowKind};
use crate::error::{InsighterError, Result};
use crate::http;

/// Tokens this close to expiry are refreshed before use.
const REFRESH_LEEWAY_SECS: i64 = 30;

/// One authenticated channel to the service.
///
/// The session owns a single token. Every request sent through
/// [`AuthSession::send`] carries a fresh bearer token and the default
/// headers. An expired token is refreshed first and the new one is written
/// back to the [`TokenStore`].
///
/// A session is meant for sequential use. Concurrent callers should hold
/// separate sessions.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use document_insighter::auth::{AuthSession, FileTokenStore, GrantFlow, TokenStoreConfig};
/// use document_insighter::config::{Credentials, Environment};
///
/// let store = FileTokenStore::new(TokenStoreConfig::new().with_path("token.json"));
/// let session = AuthSession::new(
///     Environment::staging(),
///     Credentials::new("client-id").with_secret("secret"),
///     GrantFlow::ServiceAccount,
///     Arc::new(store),
///     Some("acme"),
/// )?;
/// # Ok::<(), document_insighter::error::InsighterError>(())
/// ```
pub struct AuthSession {
    environment: Environment,
    credentials: Credentials,
    flow: GrantFlow,
    token_store: Arc<dyn TokenStore>,
    token: Mutex<Option<Token>>,
    default_headers: HeaderMap,
    http: reqwest::Client,
}

impl AuthSession {
    pub fn new(
        environment: Environment,
        credentials: Credentials,
        flow: GrantFlow,
        token_store: Arc<dyn TokenStore>,
        tenant: Option<&str>,
    ) -> Result<Self> {
        let token = token_store.load()?;
        tracing::debug!(
            flow = flow.name(),
            has_token = token.is_some(),
            "Initialized auth session"
        );
        Ok(Self {
            environment,
            credentials,
            flow,
            token_store,
            token: Mutex::new(token),
            default_headers: http::default_headers(tenant)?,
            http: http::default_client()?,
        })
    }

    /// Build a session backed by a [`FileTokenStore`] from resolved settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let flow = match settings.flow {
            FlowKind::ServiceAccount => GrantFlow::ServiceAccount,
            FlowKind::InteractiveUser => GrantFlow::interactive(),
        };
        let store = FileTokenStore::new(settings.token_store_config());
        Self::new(
            settings.environment.clone(),
            settings.credentials.clone(),
            flow,
            Arc::new(store),
            settings.tenant.as_deref(),
        )
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn flow(&self) -> &GrantFlow {
        &self.flow
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Snapshot of the current token.
    pub fn token(&self) -> Option<Token> {
        self.lock_token().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_token().is_some()
    }

    /// Make sure the session can authenticate.
    ///
    /// Service accounts never authorize interactively, so a missing token is
    /// an error. Interactive sessions return the authorization request to
    /// complete when no token is loaded or `force` is set.
    pub fn fetch_token(&self, force: bool) -> Result<TokenStatus> {
        match &self.flow {
            GrantFlow::ServiceAccount => {
                if self.is_authenticated() {
                    Ok(TokenStatus::Ready)
                } else {
                    Err(AuthError::NotLoggedIn(
                        "download the service account token and configure the token file"
                            .to_string(),
                    )
                    .into())
                }
            }
            GrantFlow::InteractiveUser(_) => {
                if self.is_authenticated() && !force {
                    Ok(TokenStatus::Ready)
                } else {
                    Ok(TokenStatus::AuthorizationRequired(self.begin_authorization()?))
                }
            }
        }
    }

    /// Start the interactive flow: the returned URL must be opened by the operator.
    pub fn begin_authorization(&self) -> Result<AuthorizationRequest> {
        let GrantFlow::InteractiveUser(grant) = &self.flow else {
            return Err(AuthError::Unsupported(
                "service-account sessions cannot authorize interactively".to_string(),
            )
            .into());
        };
        let request = grant.authorization_request(
            &self.credentials.client_id,
            self.credentials.idp_id.as_deref(),
        )?;
        tracing::debug!(url = %request.url, "Authorization URL created");
        Ok(request)
    }

    /// Finish the interactive flow with the redirect URL the operator landed on.
    ///
    /// Exchanges the authorization code and persists the resulting token.
    pub async fn complete_authorization(
        &self,
        request: &AuthorizationRequest,
        redirect_url: &str,
    ) -> Result<Token> {
        let GrantFlow::InteractiveUser(grant) = &self.flow else {
            return Err(AuthError::Unsupported(
                "service-account sessions cannot authorize interactively".to_string(),
            )
            .into());
        };
        let code = request.code_from_redirect(redirect_url)?;
        let form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code),
            ("redirect_uri", grant.redirect_uri.clone()),
        ];
        let token = self.request_token(&grant.token_url, form).await?;
        self.replace_token(token.clone())?;
        tracing::info!("Interactive authorization completed");
        Ok(token)
    }

    /// Current access token, refreshed first if it is about to expire.
    pub async fn access_token(&self) -> Result<String> {
        let token = self.token().ok_or_else(|| {
            AuthError::NotLoggedIn("no token loaded for this session".to_string())
        })?;
        if token.is_expired(Utc::now(), chrono::Duration::seconds(REFRESH_LEEWAY_SECS)) {
            return Ok(self.refresh_with(token).await?.access_token);
        }
        Ok(token.access_token)
    }

    /// Refresh unconditionally using the stored refresh token.
    pub async fn refresh(&self) -> Result<Token> {
        let token = self.token().ok_or_else(|| {
            AuthError::NotLoggedIn("no token loaded for this session".to_string())
        })?;
        self.refresh_with(token).await
    }

    async fn refresh_with(&self, current: Token) -> Result<Token> {
        let refresh_token = current.refresh_token.clone().ok_or_else(|| {
            AuthError::NotLoggedIn(
                "access token expired and no refresh token is available".to_string(),
            )
        })?;
        tracing::debug!(flow = self.flow.name(), "Refreshing access token");
        let form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.clone()),
            ("scope", self.flow.scopes().join(" ")),
        ];
        let token_url = self.flow.token_url(&self.environment).to_string();
        let mut token = self.request_token(&token_url, form).await?;
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token);
        }
        self.replace_token(token.clone())?;
        Ok(token)
    }

    async fn request_token(
        &self,
        token_url: &str,
        mut form: Vec<(&'static str, String)>,
    ) -> std::result::Result<Token, AuthError> {
        let mut request = self
            .http
            .post(token_url)
            .header("Accept", "application/json");
        match &self.credentials.client_secret {
            Some(secret) => {
                request = request.basic_auth(&self.credentials.client_id, Some(secret));
            }
            None => form.push(("client_id", self.credentials.client_id.clone())),
        }
        let resp = request.form(&form).send().await?;
        let status = resp.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::ExpiredOrInvalidGrant(body));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::InvalidResponse(format!(
                "Token request to {token_url} failed with status {status}: {body}"
            )));
        }
        let raw = resp.text().await?;
        let mut token: Token = serde_json::from_str(&raw)?;
        token.stamp_expiry(Utc::now());
        token.with_identity_bearer().normalized()
    }

    /// Swap the in-memory token and persist it as one unit.
    fn replace_token(&self, token: Token) -> std::result::Result<(), AuthError> {
        *self.lock_token() = Some(token.clone());
        if let Err(err) = self.token_store.save(&token) {
            tracing::warn!(error = %err, "Failed to persist refreshed token");
            return Err(err);
        }
        Ok(())
    }

    fn lock_token(&self) -> std::sync::MutexGuard<'_, Option<Token>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a GET request against this session's HTTP client.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    /// Start a POST request against this session's HTTP client.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url)
    }

    /// Authenticate and send a request, failing on any non-2xx status.
    pub async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        self.send_with_headers(request, HeaderMap::new()).await
    }

    /// Like [`send`](Self::send), with extra headers applied last.
    ///
    /// Default headers fill in only names the request does not already carry,
    /// whether set on the builder or passed here.
    pub async fn send_with_headers(
        &self,
        request: RequestBuilder,
        headers: HeaderMap,
    ) -> Result<reqwest::Response> {
        let access_token = self.access_token().await?;
        let mut request = request.bearer_auth(access_token).build()?;
        let request_headers = request.headers_mut();
        for (name, value) in headers.iter() {
            request_headers.insert(name.clone(), value.clone());
        }
        for (name, value) in self.default_headers.iter() {
            request_headers
                .entry(name)
                .or_insert_with(|| value.clone());
        }
        let response = self
            .http
            .execute(request)
            .await
            .map_err(InsighterError::from)?;
        tracing::debug!(
            status = response.status().as_u16(),
            url = %response.url(),
            "Request completed"
        );
        http::ensure_success(response).await
    }
}
