//! Document Insighter client SDK
//!
//! Authenticates against the Document Insighter extraction service, uploads
//! documents, waits for their extractions and pages through extraction
//! queries.
//!
//! # Quick Start
//!
//! ```no_run
//! use document_insighter::prelude::*;
//!
//! # async fn example() -> document_insighter::error::Result<()> {
//! let client = DocumentInsighter::from_env(FlowKind::ServiceAccount)?;
//! let extractions = client
//!     .upload_and_poll("BR", "br_document.pdf", None, None)
//!     .await?;
//! println!("{} extractions", extractions.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod prelude;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
