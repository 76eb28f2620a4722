//! Convenience re-exports for common use.

pub use crate::auth::{AuthSession, FileTokenStore, GrantFlow, Token, TokenStatus, TokenStore};
pub use crate::client::{DocumentInsighter, ExtractionPages, ExtractionQuery, PollPolicy};
pub use crate::config::{ClientSettings, Credentials, Environment, FlowKind};
pub use crate::error::{InsighterError, Result};
pub use crate::types::{ChannelLog, ChannelLogId, ChannelLogStatus, Extraction, Page};
