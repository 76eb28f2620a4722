//! High-level Document Insighter API client.

pub mod pages;
pub mod upload;

pub use pages::{ExtractionPages, ExtractionQuery};

use std::time::Duration;

use crate::auth::AuthSession;
use crate::config::{ClientSettings, FlowKind};
use crate::error::Result;
use crate::http;
use crate::types::{ChannelLogId, ChannelLogState};

/// How `upload_and_poll` waits for a channel log to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(600),
        }
    }
}

impl PollPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Client for the document upload, status and extraction endpoints.
///
/// # Example
/// ```no_run
/// use document_insighter::client::DocumentInsighter;
/// use document_insighter::config::FlowKind;
///
/// # async fn example() -> document_insighter::error::Result<()> {
/// let client = DocumentInsighter::from_env(FlowKind::ServiceAccount)?;
/// let extractions = client
///     .upload_and_poll("BR", "tests/data/br_document.pdf", None, None)
///     .await?;
/// println!("{} extractions", extractions.len());
/// # Ok(())
/// # }
/// ```
pub struct DocumentInsighter {
    session: AuthSession,
    poll_policy: PollPolicy,
    upgrade_next_links: bool,
}

impl DocumentInsighter {
    pub fn new(session: AuthSession) -> Self {
        Self {
            session,
            poll_policy: PollPolicy::default(),
            upgrade_next_links: true,
        }
    }

    /// Build a client from environment variables for the given flow.
    pub fn from_env(flow: FlowKind) -> Result<Self> {
        let settings = ClientSettings::from_env(flow)?;
        Ok(Self::new(AuthSession::from_settings(&settings)?))
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    /// Whether `http://` next links are followed over `https://` (default: true).
    ///
    /// Only plain-HTTP deployments such as local mock servers turn this off.
    pub fn with_upgrade_next_links(mut self, upgrade: bool) -> Self {
        self.upgrade_next_links = upgrade;
        self
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub(crate) fn url(&self, path: &str) -> String {
        self.session.environment().url(path)
    }

    /// Current processing status of a channel log.
    pub async fn get_channel_log_status(
        &self,
        channel_log_id: &ChannelLogId,
    ) -> Result<ChannelLogState> {
        let url = self.url(&format!("/api/document-channel-logs/{channel_log_id}/status"));
        let response = self.session.send(self.session.get(&url)).await?;
        http::read_json(response).await
    }

    /// All extractions produced for a channel log.
    pub async fn get_channel_extractions_exporting(
        &self,
        channel_log_id: &ChannelLogId,
    ) -> Result<Vec<serde_json::Value>> {
        let url = self.url(&format!(
            "/api/extraction-exporting/document-channel-logs/{channel_log_id}/extractions"
        ));
        let response = self.session.send(self.session.get(&url)).await?;
        http::read_json(response).await
    }
}
