//! CLI entry point for the `insighter` binary.

pub mod auth;
pub mod documents;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::auth::AuthSession;
use crate::client::DocumentInsighter;
use crate::config::{ClientSettings, Environment, EnvironmentName, FlowKind};

/// Document Insighter CLI
#[derive(Parser, Debug)]
#[command(name = "insighter", version, about = "Document Insighter client")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Authenticate as an interactive user instead of a service account
    #[arg(long, global = true)]
    pub interactive: bool,

    /// Deployment to talk to (production, staging, development)
    #[arg(long = "env", global = true)]
    pub environment: Option<EnvironmentName>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn flow(&self) -> FlowKind {
        if self.interactive {
            FlowKind::InteractiveUser
        } else {
            FlowKind::ServiceAccount
        }
    }

    /// Resolve settings from the environment, applying command-line overrides.
    pub fn settings(&self) -> crate::error::Result<ClientSettings> {
        let mut settings = ClientSettings::from_env(self.flow())?;
        if let Some(name) = self.environment {
            settings = settings.with_environment(Environment::named(name));
        }
        Ok(settings)
    }

    pub fn client(&self) -> crate::error::Result<DocumentInsighter> {
        let settings = self.settings()?;
        Ok(DocumentInsighter::new(AuthSession::from_settings(&settings)?))
    }
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authentication management
    Auth(AuthArgs),
    /// Upload a document and wait for its extractions
    Upload(UploadArgs),
    /// Show the processing status of a channel log
    Status(StatusArgs),
    /// Export extractions for a date range
    Extractions(ExtractionsArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Authorize interactively and save the token
    Login(LoginArgs),
    /// Show authentication status
    Status,
}

/// Arguments for `insighter auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Authorize again even if a token is already saved
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `insighter upload`.
#[derive(Parser, Debug)]
pub struct UploadArgs {
    /// Document category, e.g. BR or NB_COA
    #[arg(short, long)]
    pub category: String,

    /// Path of the document to upload
    #[arg(short, long)]
    pub file: PathBuf,

    /// JSON metadata attached to the document
    #[arg(short, long)]
    pub metadata: Option<String>,

    /// Upload even if the same file was uploaded before
    #[arg(long)]
    pub ignore_duplicate: bool,

    /// Return right after upload instead of waiting for extractions
    #[arg(long)]
    pub no_wait: bool,

    /// Seconds to wait for extractions
    #[arg(long, default_value_t = 600)]
    pub timeout: u64,
}

/// Arguments for `insighter status`.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Channel log id returned by an upload
    pub channel_log_id: String,
}

/// Arguments for `insighter extractions`.
#[derive(Parser, Debug)]
pub struct ExtractionsArgs {
    /// Document category
    #[arg(short, long)]
    pub category: String,

    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: NaiveDate,

    /// First day excluded (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: NaiveDate,

    /// Items per page
    #[arg(long, default_value_t = 50)]
    pub page_size: u32,

    /// Only extractions carrying these tags
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
