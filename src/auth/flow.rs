//! Grant flows supported by [`AuthSession`](super::AuthSession).

use rand::Rng;
use reqwest::Url;

use super::error::AuthError;
use crate::config::Environment;

const INTERACTIVE_REDIRECT_URI: &str = "https://localhost/callback";
const INTERACTIVE_TOKEN_URL: &str = "https://id.godeepsite.com/oauth2/default/v1/token";
const INTERACTIVE_AUTHORIZE_URL: &str = "https://id.godeepsite.com/oauth2/default/v1/authorize";

const SERVICE_ACCOUNT_SCOPES: &[&str] = &["profile", "offline_access"];
const INTERACTIVE_SCOPES: &[&str] = &["openid", "profile", "offline_access"];

/// OAuth2 strategy a session authenticates with.
#[derive(Debug, Clone)]
pub enum GrantFlow {
    /// Machine-to-machine: the token is provisioned out of band and only ever
    /// refreshed against the environment's token endpoint.
    ServiceAccount,
    /// Authorization-code flow through the identity provider.
    InteractiveUser(InteractiveGrant),
}

impl GrantFlow {
    pub fn interactive() -> Self {
        Self::InteractiveUser(InteractiveGrant::default())
    }

    pub fn scopes(&self) -> &'static [&'static str] {
        match self {
            GrantFlow::ServiceAccount => SERVICE_ACCOUNT_SCOPES,
            GrantFlow::InteractiveUser(_) => INTERACTIVE_SCOPES,
        }
    }

    /// Endpoint used for refresh (and, interactively, for code exchange).
    pub fn token_url<'a>(&'a self, environment: &'a Environment) -> &'a str {
        match self {
            GrantFlow::ServiceAccount => environment.service_account_token_url(),
            GrantFlow::InteractiveUser(grant) => &grant.token_url,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GrantFlow::ServiceAccount => "service-account",
            GrantFlow::InteractiveUser(_) => "interactive-user",
        }
    }
}

/// Endpoints for the interactive authorization-code flow.
#[derive(Debug, Clone)]
pub struct InteractiveGrant {
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
}

impl Default for InteractiveGrant {
    fn default() -> Self {
        Self {
            authorize_url: INTERACTIVE_AUTHORIZE_URL.to_string(),
            token_url: INTERACTIVE_TOKEN_URL.to_string(),
            redirect_uri: INTERACTIVE_REDIRECT_URI.to_string(),
        }
    }
}

impl InteractiveGrant {
    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    /// Build the URL the operator must visit.
    pub(crate) fn authorization_request(
        &self,
        client_id: &str,
        idp_id: Option<&str>,
    ) -> Result<AuthorizationRequest, AuthError> {
        let state = generate_state();
        let mut url = Url::parse(&self.authorize_url).map_err(|e| {
            AuthError::InvalidResponse(format!("invalid authorize url {}: {e}", self.authorize_url))
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(idp) = idp_id {
                pairs.append_pair("idp", idp);
            }
            pairs
                .append_pair("response_type", "code")
                .append_pair("client_id", client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", &INTERACTIVE_SCOPES.join(" "))
                .append_pair("state", &state);
        }
        Ok(AuthorizationRequest {
            url: url.into(),
            state,
        })
    }
}

/// First half of the interactive flow: where to send the operator, and the
/// state the redirect must echo back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

impl AuthorizationRequest {
    /// Pull the authorization code out of the pasted redirect URL.
    pub(crate) fn code_from_redirect(&self, redirect_url: &str) -> Result<String, AuthError> {
        let url = Url::parse(redirect_url.trim())
            .map_err(|e| AuthError::InvalidResponse(format!("invalid redirect url: {e}")))?;
        let mut code = None;
        let mut state = None;
        let mut error = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                _ => {}
            }
        }
        if let Some(error) = error {
            return Err(AuthError::AccessDenied(error));
        }
        if state.as_deref() != Some(self.state.as_str()) {
            return Err(AuthError::StateMismatch);
        }
        code.filter(|c| !c.is_empty()).ok_or_else(|| {
            AuthError::InvalidResponse("redirect url carries no authorization code".to_string())
        })
    }
}

/// Outcome of [`AuthSession::fetch_token`](super::AuthSession::fetch_token).
#[derive(Debug, Clone)]
pub enum TokenStatus {
    /// A token is loaded; requests can be made.
    Ready,
    /// The operator must visit the URL and hand back the redirect.
    AuthorizationRequired(AuthorizationRequest),
}

fn generate_state() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_differ_per_flow() {
        assert_eq!(GrantFlow::ServiceAccount.scopes(), &["profile", "offline_access"]);
        assert_eq!(
            GrantFlow::interactive().scopes(),
            &["openid", "profile", "offline_access"]
        );
    }

    #[test]
    fn service_account_refreshes_against_environment() {
        let env = Environment::custom("https://h", "https://h/token");
        assert_eq!(GrantFlow::ServiceAccount.token_url(&env), "https://h/token");
        assert_eq!(GrantFlow::interactive().token_url(&env), INTERACTIVE_TOKEN_URL);
    }

    #[test]
    fn authorization_url_carries_idp_and_redirect() {
        let grant = InteractiveGrant::default();
        let req = grant.authorization_request("client-1", Some("idp-9")).unwrap();
        assert!(req.url.starts_with(INTERACTIVE_AUTHORIZE_URL));
        assert!(req.url.contains("idp=idp-9"));
        assert!(req.url.contains("response_type=code"));
        assert!(req.url.contains("client_id=client-1"));
        assert!(req.url.contains("redirect_uri=https%3A%2F%2Flocalhost%2Fcallback"));
        assert!(req.url.contains("scope=openid+profile+offline_access"));
        assert!(req.url.contains(&format!("state={}", req.state)));
    }

    #[test]
    fn state_is_unique_per_request() {
        let grant = InteractiveGrant::default();
        let a = grant.authorization_request("c", None).unwrap();
        let b = grant.authorization_request("c", None).unwrap();
        assert_ne!(a.state, b.state);
    }

    #[test]
    fn code_is_extracted_from_matching_redirect() {
        let req = AuthorizationRequest {
            url: String::new(),
            state: "s1".to_string(),
        };
        let code = req
            .code_from_redirect("https://localhost/callback?code=abc&state=s1")
            .unwrap();
        assert_eq!(code, "abc");
    }

    #[test]
    fn redirect_with_wrong_state_is_rejected() {
        let req = AuthorizationRequest {
            url: String::new(),
            state: "s1".to_string(),
        };
        let err = req
            .code_from_redirect("https://localhost/callback?code=abc&state=other")
            .unwrap_err();
        assert!(matches!(err, AuthError::StateMismatch));
    }

    #[test]
    fn redirect_with_error_is_access_denied() {
        let req = AuthorizationRequest {
            url: String::new(),
            state: "s1".to_string(),
        };
        let err = req
            .code_from_redirect("https://localhost/callback?error=access_denied&state=s1")
            .unwrap_err();
        assert!(matches!(err, AuthError::AccessDenied(e) if e == "access_denied"));
    }
}
