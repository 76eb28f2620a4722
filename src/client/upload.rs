//! Document upload, duplicate detection and completion polling.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde_json::json;
use tokio::time::Instant;

use super::{DocumentInsighter, PollPolicy};
use crate::error::{InsighterError, Result};
use crate::http;
use crate::types::{ChannelLog, ChannelLogId, ChannelLogStatus};
use crate::util::md5_hex;

impl DocumentInsighter {
    /// Channel logs already holding a document with this MD5 checksum.
    pub async fn find_duplicates(&self, checksum: &str) -> Result<Vec<ChannelLogId>> {
        let url = self.url(&format!(
            "/api/document-channel-logs/md5-checksum/{checksum}/uuids"
        ));
        let response = self.session.send(self.session.get(&url)).await?;
        http::read_json(response).await
    }

    /// Upload one document for extraction.
    ///
    /// Unless `ignore_duplicate` is set, the file's checksum is looked up
    /// first and a match aborts with [`InsighterError::DuplicateDocument`]
    /// before anything is uploaded. Returns the first channel log the service
    /// reports, if any.
    pub async fn upload_document(
        &self,
        category: &str,
        file_path: impl AsRef<Path>,
        metadata: Option<serde_json::Value>,
        ignore_duplicate: bool,
    ) -> Result<Option<ChannelLog>> {
        let path = file_path.as_ref();
        let data = tokio::fs::read(path).await?;

        if !ignore_duplicate {
            let checksum = md5_hex(&data);
            let existing = self.find_duplicates(&checksum).await?;
            if !existing.is_empty() {
                return Err(InsighterError::DuplicateDocument {
                    checksum,
                    channel_log_ids: existing.iter().map(ToString::to_string).collect(),
                });
            }
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                InsighterError::Configuration(format!("{} has no file name", path.display()))
            })?;
        let fields = json!([metadata.unwrap_or_else(|| json!({}))]).to_string();
        let form = Form::new()
            .part("fields", Part::text(fields).mime_str("application/json")?)
            .part(
                "files",
                Part::bytes(data)
                    .file_name(file_name.clone())
                    .mime_str("application/octet-stream")?,
            );

        tracing::info!(category, file = %file_name, "Starts upload document");
        let request = self
            .session
            .post(&self.url("/api/documents/common/upload"))
            .query(&[("category", category), ("syncExtractionMetadata", "true")])
            .multipart(form);
        let response = self.session.send(request).await?;
        let logs: Vec<ChannelLog> = http::read_json(response).await?;
        tracing::info!(category, file = %file_name, "Ends upload document");
        Ok(logs.into_iter().next())
    }

    /// Upload a document and wait until its extractions are ready.
    ///
    /// Polls the channel log status at the client's poll interval until it
    /// is COMPLETED or FAILED, then returns the channel log's extractions.
    /// Both terminal states fetch extractions; check
    /// [`get_channel_log_status`](Self::get_channel_log_status) to tell them
    /// apart. `timeout` overrides the client's poll timeout.
    pub async fn upload_and_poll(
        &self,
        category: &str,
        file_path: impl AsRef<Path>,
        metadata: Option<serde_json::Value>,
        timeout: Option<Duration>,
    ) -> Result<Vec<serde_json::Value>> {
        let log = self
            .upload_document(category, file_path, metadata, false)
            .await?
            .ok_or_else(|| {
                InsighterError::InvalidResponse("upload returned no channel log".to_string())
            })?;

        let policy = match timeout {
            Some(timeout) => self.poll_policy.with_timeout(timeout),
            None => self.poll_policy,
        };
        tracing::info!(channel_log_id = %log.id, "Starts polling extractions");
        let status = self.wait_for_terminal(&log.id, policy).await?;
        let extractions = self.get_channel_extractions_exporting(&log.id).await?;
        tracing::info!(
            channel_log_id = %log.id,
            status = %status,
            extractions = extractions.len(),
            "Ends polling extractions"
        );
        Ok(extractions)
    }

    /// Poll a channel log until it reaches a terminal status.
    ///
    /// The first poll is immediate. Once the deadline has passed after a
    /// non-terminal poll, fails with [`InsighterError::PollTimeout`].
    pub async fn wait_for_terminal(
        &self,
        channel_log_id: &ChannelLogId,
        policy: PollPolicy,
    ) -> Result<ChannelLogStatus> {
        let deadline = Instant::now() + policy.timeout;
        loop {
            let state = self.get_channel_log_status(channel_log_id).await?;
            tracing::debug!(channel_log_id = %channel_log_id, status = %state.status, "Polled status");
            if state.status.is_terminal() {
                return Ok(state.status);
            }
            if Instant::now() >= deadline {
                return Err(InsighterError::PollTimeout {
                    channel_log_id: channel_log_id.to_string(),
                    timeout: policy.timeout,
                });
            }
            tokio::time::sleep(policy.interval).await;
        }
    }
}
