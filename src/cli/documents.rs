//! CLI handlers for uploads, status checks and extraction exports.

use std::time::Duration;

use futures::StreamExt;

use super::{ExtractionsArgs, GlobalArgs, StatusArgs, UploadArgs};
use crate::client::{ExtractionQuery, PollPolicy};
use crate::error::InsighterError;
use crate::types::ChannelLogId;

/// Handle `insighter upload`.
pub async fn handle_upload(
    global: &GlobalArgs,
    args: UploadArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = args
        .metadata
        .as_deref()
        .map(|raw| serde_json::from_str::<serde_json::Value>(raw))
        .transpose()
        .map_err(|e| InsighterError::Configuration(format!("--metadata is not valid JSON: {e}")))?;
    let client = global.client()?;

    let Some(log) = client
        .upload_document(&args.category, &args.file, metadata, args.ignore_duplicate)
        .await?
    else {
        println!("⚠️  Upload accepted but no channel log was returned");
        return Ok(());
    };
    eprintln!("📄 Uploaded as channel log {}", log.id);
    if args.no_wait {
        println!("{}", log.id);
        return Ok(());
    }

    let policy = PollPolicy::default().with_timeout(Duration::from_secs(args.timeout));
    let status = client.wait_for_terminal(&log.id, policy).await?;
    eprintln!("⏳ Channel log finished with status {status}");
    let extractions = client.get_channel_extractions_exporting(&log.id).await?;
    println!("{}", serde_json::to_string_pretty(&extractions)?);
    Ok(())
}

/// Handle `insighter status`.
pub async fn handle_status(
    global: &GlobalArgs,
    args: StatusArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = global.client()?;
    let state = client
        .get_channel_log_status(&ChannelLogId::new(args.channel_log_id))
        .await?;
    println!("{}", state.status);
    Ok(())
}

/// Handle `insighter extractions`: prints one JSON item per line.
pub async fn handle_extractions(
    global: &GlobalArgs,
    args: ExtractionsArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = global.client()?;
    let query = ExtractionQuery::builder()
        .category(args.category)
        .start_date(args.start_date)
        .end_date(args.end_date)
        .page_size(args.page_size)
        .tags(args.tags)
        .build();

    let mut pages = Box::pin(client.query_extractions_pages(query).into_stream());
    let mut total = 0usize;
    while let Some(page) = pages.next().await {
        let page = page?;
        total += page.len();
        for item in &page.items {
            println!("{item}");
        }
    }
    eprintln!("📊 {total} extractions");
    Ok(())
}
