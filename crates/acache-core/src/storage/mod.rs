//! Storage backend: local existence checks, hashing and network-to-disk transfers.
//!
//! The cache talks to storage only through [`StorageBackend`]. [`FsBackend`]
//! is the real implementation (local filesystem + curl).

mod fetch;
mod fs;
mod writer;

pub use fetch::{download_to, fetch_bytes};
pub use fs::FsBackend;
pub use writer::StorageWriter;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::asset::AssetKind;
use crate::checksum::HashAlgorithm;
use crate::error::AssetError;
use crate::uri::sanitize_component;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

#[derive(Debug, Clone, Copy, Default)]
pub struct StatOptions {
    pub compute_hash: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStat {
    pub exists: bool,
    /// Content hash, when requested and the file exists.
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadOptions {
    pub compute_hash: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadInfo {
    /// Hash of the bytes now at the destination, when requested.
    pub hash: Option<String>,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Path of a pre-bundled copy of the asset, if the application ships one. No I/O beyond a local lookup.
    fn path_for_embedded(&self, hash: &str, kind: &AssetKind) -> Option<PathBuf>;

    async fn stat(&self, path: &Path, opts: StatOptions) -> Result<FileStat, AssetError>;

    /// Transfers `uri` to `dest`, replacing whatever is there.
    async fn download(
        &self,
        uri: &str,
        dest: &Path,
        opts: DownloadOptions,
    ) -> Result<DownloadInfo, AssetError>;

    /// Drops a file that failed verification so the next attempt starts clean.
    async fn discard(&self, _path: &Path) -> Result<(), AssetError> {
        Ok(())
    }
}

/// Path for the temp file: appends `.part` to the final path (e.g. `a.png` → `a.png.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

fn with_kind(stem: String, kind: &AssetKind) -> String {
    let ext = sanitize_component(kind.as_str());
    if ext.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, ext)
    }
}

/// Deterministic cache location for a verified asset: `<cache_dir>/asset-<hash>.<kind>`.
pub fn local_asset_path(cache_dir: &Path, hash: &str, kind: &AssetKind) -> PathBuf {
    cache_dir.join(with_kind(
        format!("asset-{}", sanitize_component(hash)),
        kind,
    ))
}

/// Cache location for an asset with no content hash, keyed by its URI.
pub fn local_uri_path(cache_dir: &Path, uri: &str, kind: &AssetKind) -> PathBuf {
    let digest = HashAlgorithm::Sha256.hash_bytes(uri.as_bytes());
    cache_dir.join(with_kind(format!("uri-{}", &digest[..16]), kind))
}

/// File name of an embedded asset inside the embedded assets dir.
pub fn embedded_file_name(hash: &str, kind: &AssetKind) -> String {
    with_kind(format!("asset_{}", sanitize_component(hash)), kind)
}
