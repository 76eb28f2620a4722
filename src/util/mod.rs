//! Utility modules: checksums and private file writes.

pub mod checksum;
pub mod fs;

pub use checksum::{md5_checksum, md5_hex};
pub use fs::write_private;
