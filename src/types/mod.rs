//! Wire types for Document Insighter.

pub mod channel_log;
pub mod extraction;

pub use channel_log::*;
pub use extraction::*;
