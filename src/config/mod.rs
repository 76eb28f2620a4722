//! Configuration system (layered: code > env > `.env` file).

use std::path::PathBuf;

use strum::{Display, EnumString};

use crate::auth::TokenStoreConfig;
use crate::error::{InsighterError, Result};

const PRODUCTION_HOST: &str = "https://document-insighter.godeepsite.com";
const STAGING_HOST: &str = "https://document-insighter-staging.godeepsite.com";
const DEVELOPMENT_HOST: &str = "https://document-insighter-dev.godeepsite.com";
const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/api/service-accounts/token";

/// Named deployment environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EnvironmentName {
    Production,
    Staging,
    Development,
}

/// Service endpoints for one deployment. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    host: String,
    service_account_token_url: String,
}

impl Environment {
    pub fn production() -> Self {
        Self::for_host(PRODUCTION_HOST)
    }

    pub fn staging() -> Self {
        Self::for_host(STAGING_HOST)
    }

    pub fn development() -> Self {
        Self::for_host(DEVELOPMENT_HOST)
    }

    /// Explicit host and token-refresh endpoint (self-hosted or test servers).
    pub fn custom(host: impl Into<String>, service_account_token_url: impl Into<String>) -> Self {
        Self {
            host: trim_host(host.into()),
            service_account_token_url: service_account_token_url.into(),
        }
    }

    /// A host whose token endpoint lives at the default path under it.
    pub fn for_host(host: impl Into<String>) -> Self {
        let host = trim_host(host.into());
        let service_account_token_url = format!("{host}{SERVICE_ACCOUNT_TOKEN_PATH}");
        Self {
            host,
            service_account_token_url,
        }
    }

    pub fn named(name: EnvironmentName) -> Self {
        match name {
            EnvironmentName::Production => Self::production(),
            EnvironmentName::Staging => Self::staging(),
            EnvironmentName::Development => Self::development(),
        }
    }

    /// Base host URL without a trailing slash.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Token endpoint used to refresh service-account tokens.
    pub fn service_account_token_url(&self) -> &str {
        &self.service_account_token_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::production()
    }
}

fn trim_host(host: String) -> String {
    host.trim_end_matches('/').to_string()
}

/// OAuth client credentials, owned by a session for its lifetime.
#[derive(Clone, Default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub idp_id: Option<String>,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_idp(mut self, idp_id: impl Into<String>) -> Self {
        self.idp_id = Some(idp_id.into());
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| ".."))
            .field("idp_id", &self.idp_id)
            .finish()
    }
}

/// Which grant flow a set of environment variables configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    ServiceAccount,
    InteractiveUser,
}

struct EnvNames {
    client_id: &'static str,
    client_secret: &'static str,
    token_path: &'static str,
    token_json: &'static str,
    idp_id: Option<&'static str>,
}

impl FlowKind {
    fn env_names(self) -> EnvNames {
        match self {
            FlowKind::ServiceAccount => EnvNames {
                client_id: "INSIGHTER_SA_CLIENT_ID",
                client_secret: "INSIGHTER_SA_CLIENT_SECRET",
                token_path: "INSIGHTER_SA_CLIENT_TOKEN_PATH",
                token_json: "INSIGHTER_SA_CLIENT_TOKEN_JSON",
                idp_id: None,
            },
            FlowKind::InteractiveUser => EnvNames {
                client_id: "INSIGHTER_CLIENT_ID",
                client_secret: "INSIGHTER_CLIENT_SECRET",
                token_path: "INSIGHTER_CLIENT_TOKEN_PATH",
                token_json: "INSIGHTER_CLIENT_TOKEN_JSON",
                idp_id: Some("INSIGHTER_CLIENT_IDP"),
            },
        }
    }
}

pub const TENANT_ENV: &str = "INSIGHTER_TENANT";
pub const ENVIRONMENT_ENV: &str = "INSIGHTER_ENV";

/// Everything needed to build a session, resolved from code or environment.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub flow: FlowKind,
    pub environment: Environment,
    pub credentials: Credentials,
    pub token_path: Option<PathBuf>,
    pub token_json: Option<String>,
    pub tenant: Option<String>,
}

impl ClientSettings {
    pub fn new(flow: FlowKind, environment: Environment, credentials: Credentials) -> Self {
        Self {
            flow,
            environment,
            credentials,
            token_path: None,
            token_json: None,
            tenant: None,
        }
    }

    /// Load from environment variables, reading `.env` first if present.
    ///
    /// Each flow reads its own variable set; see [`FlowKind`].
    pub fn from_env(flow: FlowKind) -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(flow, |name| std::env::var(name).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(flow: FlowKind, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let names = flow.env_names();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let client_id = non_empty(names.client_id).ok_or_else(|| {
            InsighterError::Configuration(format!("{} is not set", names.client_id))
        })?;
        let environment = match non_empty(ENVIRONMENT_ENV) {
            Some(raw) => {
                let name: EnvironmentName = raw.parse().map_err(|_| {
                    InsighterError::Configuration(format!(
                        "{ENVIRONMENT_ENV}={raw} is not one of production, staging, development"
                    ))
                })?;
                Environment::named(name)
            }
            None => Environment::default(),
        };

        Ok(Self {
            flow,
            environment,
            credentials: Credentials {
                client_id,
                client_secret: non_empty(names.client_secret),
                idp_id: names.idp_id.and_then(|name| non_empty(name)),
            },
            token_path: non_empty(names.token_path).map(PathBuf::from),
            token_json: non_empty(names.token_json),
            tenant: non_empty(TENANT_ENV),
        })
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn with_token_json(mut self, json: impl Into<String>) -> Self {
        self.token_json = Some(json.into());
        self
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Token store configuration derived from these settings.
    pub fn token_store_config(&self) -> TokenStoreConfig {
        TokenStoreConfig {
            path: self.token_path.clone(),
            inline: self
                .token_json
                .clone()
                .map(crate::auth::InlineToken::Json),
        }
    }
}
