//! Local filesystem backend with curl transfers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{
    embedded_file_name, fetch, temp_path, DownloadInfo, DownloadOptions, FileStat, StatOptions,
    StorageBackend, StorageWriter,
};
use crate::asset::AssetKind;
use crate::checksum::HashAlgorithm;
use crate::config::{AcacheConfig, TransferConfig};
use crate::error::AssetError;
use crate::uri;

pub struct FsBackend {
    embedded_dir: Option<PathBuf>,
    algorithm: HashAlgorithm,
    transfer: TransferConfig,
}

impl FsBackend {
    pub fn new(
        embedded_dir: Option<PathBuf>,
        algorithm: HashAlgorithm,
        transfer: TransferConfig,
    ) -> Self {
        Self {
            embedded_dir,
            algorithm,
            transfer,
        }
    }

    pub fn from_config(cfg: &AcacheConfig) -> Self {
        Self::new(
            cfg.embedded_dir.clone(),
            cfg.hash_algorithm,
            cfg.transfer_or_default(),
        )
    }

    async fn hash_file(&self, path: &Path) -> Result<String> {
        let algorithm = self.algorithm;
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || algorithm.hash_path(&path))
            .await
            .context("hash task join")?
    }

    /// Writes `uri` into `<dest>.part`, then renames it to `dest`.
    async fn fetch_into(&self, uri: &str, dest: &Path) -> Result<u64> {
        if let Some(dir) = dest.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create cache dir {}", dir.display()))?;
        }
        let inline = if uri::is_data_uri(uri) {
            Some(uri::decode_data_uri(uri)?)
        } else {
            None
        };
        let tp = temp_path(dest);
        let writer = StorageWriter::create(&tp)?;

        let written = if let Some(bytes) = inline {
            writer.write_at(0, &bytes).map(|()| bytes.len() as u64)
        } else {
            tokio::task::spawn_blocking({
                let uri = uri.to_string();
                let writer = writer.clone();
                let transfer = self.transfer.clone();
                move || fetch::download_to(&uri, &writer, &transfer)
            })
            .await
            .context("download task join")
            .and_then(|r| r)
        };

        match written.and_then(|n| writer.sync().map(|()| n)) {
            Ok(n) => {
                writer.finalize(dest)?;
                Ok(n)
            }
            Err(e) => {
                writer.discard();
                Err(e)
            }
        }
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    fn path_for_embedded(&self, hash: &str, kind: &AssetKind) -> Option<PathBuf> {
        let path = self
            .embedded_dir
            .as_ref()?
            .join(embedded_file_name(hash, kind));
        path.is_file().then_some(path)
    }

    async fn stat(&self, path: &Path, opts: StatOptions) -> Result<FileStat, AssetError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .with_context(|| format!("stat {}", path.display()))
            .map_err(|e| AssetError::transfer(path.display().to_string(), e))?;
        if !exists || !opts.compute_hash {
            return Ok(FileStat { exists, hash: None });
        }
        let hash = self
            .hash_file(path)
            .await
            .map_err(|e| AssetError::transfer(path.display().to_string(), e))?;
        Ok(FileStat {
            exists,
            hash: Some(hash),
        })
    }

    async fn download(
        &self,
        uri: &str,
        dest: &Path,
        opts: DownloadOptions,
    ) -> Result<DownloadInfo, AssetError> {
        let written = self
            .fetch_into(uri, dest)
            .await
            .map_err(|e| AssetError::transfer(uri, e))?;
        tracing::debug!("wrote {} bytes from {} to {}", written, uri, dest.display());
        if !opts.compute_hash {
            return Ok(DownloadInfo { hash: None });
        }
        let hash = self
            .hash_file(dest)
            .await
            .map_err(|e| AssetError::transfer(uri, e))?;
        Ok(DownloadInfo { hash: Some(hash) })
    }

    async fn discard(&self, path: &Path) -> Result<(), AssetError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AssetError::transfer(
                path.display().to_string(),
                anyhow::Error::new(e).context("remove rejected file"),
            )),
        }
    }
}
