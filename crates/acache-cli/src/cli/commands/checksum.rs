//! `acache checksum` – compute the content hash of a file.

use anyhow::{Context, Result};
use acache_core::checksum::HashAlgorithm;
use std::path::Path;

/// Compute and print the digest of the given file.
pub async fn run_checksum(path: &Path, algorithm: HashAlgorithm) -> Result<()> {
    let owned = path.to_path_buf();
    let digest = tokio::task::spawn_blocking(move || algorithm.hash_path(&owned))
        .await
        .context("checksum task join")??;
    println!("{}  {}", digest, path.display());
    Ok(())
}
