//! Ensure-local worker: one transfer per handle, outcome shared with every waiter.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

use super::handle::{AssetHandle, Location, Outcome, Resolution};
use crate::config::StorageMode;
use crate::error::AssetError;
use crate::probe::ImageProbe;
use crate::storage::{self, DownloadOptions, StatOptions, StorageBackend};
use crate::uri;

/// Everything a transfer task needs; cloned into each spawned task.
#[derive(Clone)]
pub(crate) struct Fetcher {
    pub storage: Arc<dyn StorageBackend>,
    pub probe: Arc<dyn ImageProbe>,
    pub mode: StorageMode,
    pub cache_dir: PathBuf,
}

impl Fetcher {
    pub(crate) async fn fetch(&self, handle: &AssetHandle) -> Result<Resolution, AssetError> {
        match self.mode {
            StorageMode::Remote => self.fetch_remote(handle).await,
            StorageMode::Durable => self.fetch_durable(handle).await,
        }
    }

    /// No durable storage: serve from the URI, probing decodable images for size and name.
    async fn fetch_remote(&self, handle: &AssetHandle) -> Result<Resolution, AssetError> {
        let uri = handle.source_uri();
        let kind = handle.kind();
        if kind.is_image() {
            if self.probe.supports(kind) {
                let info = self.probe.probe(uri).await?;
                return Ok(Resolution {
                    location: Location::Remote(uri.to_string()),
                    name: Some(info.name),
                    width: Some(info.width),
                    height: Some(info.height),
                });
            }
            tracing::debug!("no decoder for {} images; serving {} without dimensions", kind, uri);
        }
        Ok(Resolution {
            location: Location::Remote(uri.to_string()),
            name: Some(uri::filename_from_uri(uri)),
            width: None,
            height: None,
        })
    }

    async fn fetch_durable(&self, handle: &AssetHandle) -> Result<Resolution, AssetError> {
        let uri = handle.source_uri();
        let expected = handle.hash();
        let path = match expected {
            Some(hash) => storage::local_asset_path(&self.cache_dir, hash, handle.kind()),
            None => storage::local_uri_path(&self.cache_dir, uri, handle.kind()),
        };
        let verify = expected.is_some();

        let stat = self
            .storage
            .stat(&path, StatOptions { compute_hash: verify })
            .await?;
        let fresh = stat.exists
            && match expected {
                Some(hash) => stat
                    .hash
                    .as_deref()
                    .is_some_and(|h| h.eq_ignore_ascii_case(hash)),
                None => true,
            };

        if fresh {
            tracing::debug!("cache hit for {} at {}", uri, path.display());
        } else {
            tracing::info!("downloading {} to {}", uri, path.display());
            let info = self
                .storage
                .download(uri, &path, DownloadOptions { compute_hash: verify })
                .await?;
            if let Some(expected) = expected {
                let actual = info.hash.unwrap_or_default();
                if !actual.eq_ignore_ascii_case(expected) {
                    tracing::warn!(
                        "integrity check failed for {}: expected {}, got {}",
                        uri,
                        expected,
                        actual
                    );
                    if let Err(e) = self.storage.discard(&path).await {
                        tracing::warn!("could not discard {}: {}", path.display(), e);
                    }
                    return Err(AssetError::Integrity {
                        name: handle.display_name(),
                        uri: uri.to_string(),
                        expected: expected.to_string(),
                        actual,
                    });
                }
            }
            tracing::info!("downloaded {}", uri);
        }

        Ok(Resolution {
            location: Location::Path(path),
            name: None,
            width: None,
            height: None,
        })
    }
}

fn abandoned(uri: &str) -> AssetError {
    AssetError::Transfer {
        uri: uri.to_string(),
        reason: "download task ended without a result".to_string(),
    }
}

/// Settles the handle and its waiters exactly once. If dropped unsettled
/// (task panicked or the runtime shut down) the handle goes back to
/// unresolved and waiters get a transfer error.
struct SettleGuard {
    handle: Arc<AssetHandle>,
    tx: Option<watch::Sender<Option<Outcome>>>,
}

impl SettleGuard {
    fn settle(&mut self, result: Result<Resolution, AssetError>) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let outcome = self.handle.finish_download(result);
        tx.send_replace(Some(outcome));
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if self.tx.is_some() {
            let err = abandoned(self.handle.source_uri());
            self.settle(Err(err));
        }
    }
}

/// Runs the transfer for `handle` to completion. Spawned, so callers dropping
/// their futures do not cancel it.
pub(crate) async fn run_download(
    fetcher: Fetcher,
    handle: Arc<AssetHandle>,
    tx: watch::Sender<Option<Outcome>>,
) {
    let mut guard = SettleGuard {
        handle: Arc::clone(&handle),
        tx: Some(tx),
    };
    let result = fetcher.fetch(&handle).await;
    if let Err(e) = &result {
        tracing::debug!("fetch of {} failed: {}", handle.source_uri(), e);
    }
    guard.settle(result);
}

/// Waits for the shared outcome of an in-flight download.
pub(crate) async fn wait_outcome(
    mut rx: watch::Receiver<Option<Outcome>>,
    uri: &str,
) -> Outcome {
    match rx.wait_for(Option::is_some).await {
        Ok(value) => (*value).clone().unwrap_or_else(|| Err(abandoned(uri))),
        Err(_) => Err(abandoned(uri)),
    }
}
