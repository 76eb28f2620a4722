//! Content checksums for duplicate detection.

use std::path::Path;

use md5::{Digest, Md5};

/// Hex-encoded MD5 digest of `data`.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Hex-encoded MD5 digest of the whole file at `path`.
pub async fn md5_checksum(path: impl AsRef<Path>) -> std::io::Result<String> {
    let data = tokio::fs::read(path).await?;
    Ok(md5_hex(&data))
}
