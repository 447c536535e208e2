//! Asset cache: deduplicated handles plus a per-handle ensure-local state machine.
//!
//! A handle moves `Unresolved -> Downloading -> Resolved`, falling back to
//! `Unresolved` when a transfer fails. While a transfer runs, further callers
//! subscribe to its outcome instead of starting another one; every caller
//! observes the identical success or error. Failed transfers are not retried
//! internally; calling [`AssetCache::ensure_local`] again starts over.

mod download;
mod handle;
mod registry;

pub use handle::{AssetHandle, AssetIdentity, Location};
pub use registry::Registry;

use anyhow::Result;
use futures_util::future::try_join_all;
use std::path::PathBuf;
use std::sync::Arc;

use crate::asset::{AssetDescriptor, AssetRef};
use crate::config::{AcacheConfig, StorageMode};
use crate::error::AssetError;
use crate::probe::{CurlImageProbe, ImageProbe};
use crate::resolver::{ManifestResolver, SourceResolver};
use crate::storage::{FsBackend, StorageBackend};
use download::{run_download, wait_outcome, Fetcher};
use handle::Begin;

/// Storage mode and layout for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub mode: StorageMode,
    pub cache_dir: PathBuf,
}

pub struct AssetCache {
    registry: Registry,
    resolver: Arc<dyn SourceResolver>,
    fetcher: Fetcher,
}

impl AssetCache {
    pub fn new(
        resolver: Arc<dyn SourceResolver>,
        storage: Arc<dyn StorageBackend>,
        probe: Arc<dyn ImageProbe>,
        options: CacheOptions,
    ) -> Self {
        Self {
            registry: Registry::new(),
            resolver,
            fetcher: Fetcher {
                storage,
                probe,
                mode: options.mode,
                cache_dir: options.cache_dir,
            },
        }
    }

    /// Wires the manifest resolver, filesystem backend and curl probe from config.
    pub fn from_config(cfg: &AcacheConfig) -> Result<Self> {
        let resolver = match &cfg.manifest {
            Some(path) => ManifestResolver::load(path, cfg.pixel_ratio)?,
            None => ManifestResolver::new(Vec::new(), cfg.pixel_ratio)?,
        };
        let options = CacheOptions {
            mode: cfg.storage,
            cache_dir: cfg.resolved_cache_dir()?,
        };
        tracing::debug!(
            "asset cache: mode {:?}, dir {}",
            options.mode,
            options.cache_dir.display()
        );
        Ok(Self::new(
            Arc::new(resolver),
            Arc::new(FsBackend::from_config(cfg)),
            Arc::new(CurlImageProbe::new(cfg.transfer_or_default())),
            options,
        ))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the handle for `asset`, creating and registering it on first use.
    /// Unknown module ids fail with [`AssetError::NotFound`].
    pub fn resolve(&self, asset: &AssetRef) -> Result<Arc<AssetHandle>, AssetError> {
        match asset {
            AssetRef::Module(id) => {
                let desc = self.resolver.resolve(id)?;
                Ok(self.resolve_metadata(&desc))
            }
            AssetRef::Uri(uri) => Ok(self.resolve_uri(uri)),
        }
    }

    /// Registers a descriptor produced by a resolver (or a host renderer).
    /// A descriptor whose hash matches an embedded asset starts out resolved.
    pub fn resolve_metadata(&self, desc: &AssetDescriptor) -> Arc<AssetHandle> {
        let Some(hash) = &desc.hash else {
            return self
                .registry
                .get_or_insert_uri(&desc.uri, || AssetHandle::from_descriptor(desc, None));
        };
        if let Some(existing) = self.registry.get_by_hash(hash) {
            return existing;
        }
        // The embedded lookup touches the filesystem; keep it outside the registry lock.
        let embedded = self.fetcher.storage.path_for_embedded(hash, &desc.kind);
        if let Some(path) = &embedded {
            tracing::debug!("asset {} is embedded at {}", hash, path.display());
        }
        self.registry.get_or_insert_hashed(hash, &desc.uri, || {
            AssetHandle::from_descriptor(desc, embedded)
        })
    }

    pub fn resolve_uri(&self, uri: &str) -> Arc<AssetHandle> {
        self.registry
            .get_or_insert_uri(uri, || AssetHandle::from_uri(uri))
    }

    /// Makes the asset available locally. Returns at once when resolved; joins
    /// the running transfer when one is in flight; otherwise starts one.
    pub async fn ensure_local(&self, handle: &Arc<AssetHandle>) -> Result<(), AssetError> {
        let rx = match handle.begin_download() {
            Begin::Resolved => return Ok(()),
            Begin::Joined(rx) => {
                tracing::debug!("waiting on in-flight download of {}", handle.source_uri());
                rx
            }
            Begin::Started(tx, rx) => {
                tokio::spawn(run_download(self.fetcher.clone(), Arc::clone(handle), tx));
                rx
            }
        };
        wait_outcome(rx, handle.source_uri()).await
    }

    /// Resolves every asset, then ensures all are local concurrently. Fails
    /// with the first error; transfers already started still run to
    /// completion and leave their handles resolved.
    pub async fn load_many(&self, assets: &[AssetRef]) -> Result<Vec<Arc<AssetHandle>>, AssetError> {
        let handles = assets
            .iter()
            .map(|a| self.resolve(a))
            .collect::<Result<Vec<_>, _>>()?;
        try_join_all(handles.iter().map(|h| self.ensure_local(h))).await?;
        Ok(handles)
    }

    /// Render-time source substitution: the local location when resolved, else
    /// the original URI. Never blocks on a transfer.
    pub fn render_uri(&self, handle: &AssetHandle) -> String {
        handle.render_uri()
    }

    /// Like [`render_uri`](Self::render_uri) for a descriptor, registering it first.
    pub fn render_uri_for(&self, desc: &AssetDescriptor) -> String {
        self.resolve_metadata(desc).render_uri()
    }
}
