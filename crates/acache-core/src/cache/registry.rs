//! Process-lifetime registry deduplicating handles by content hash and by URI.
//!
//! Handles are never evicted. Hash lookups only consult the hash map and URI
//! lookups only the URI map; a hashed handle is additionally indexed by its
//! URI when that slot is free, so a later raw-URI lookup reuses the verified
//! handle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::handle::AssetHandle;

#[derive(Default)]
struct Maps {
    by_hash: HashMap<String, Arc<AssetHandle>>,
    by_uri: HashMap<String, Arc<AssetHandle>>,
}

#[derive(Default)]
pub struct Registry {
    maps: Mutex<Maps>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Maps> {
        self.maps.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_by_hash(&self, hash: &str) -> Option<Arc<AssetHandle>> {
        self.lock().by_hash.get(hash).cloned()
    }

    pub fn get_by_uri(&self, uri: &str) -> Option<Arc<AssetHandle>> {
        self.lock().by_uri.get(uri).cloned()
    }

    /// Inserts `handle` under the keys it is known by. If its primary key is
    /// already present the registry is unchanged and the existing handle is returned.
    pub fn register(&self, handle: AssetHandle) -> Arc<AssetHandle> {
        match handle.hash().map(str::to_owned) {
            Some(hash) => {
                let uri = handle.source_uri().to_owned();
                self.get_or_insert_hashed(&hash, &uri, || handle)
            }
            None => {
                let uri = handle.source_uri().to_owned();
                self.get_or_insert_uri(&uri, || handle)
            }
        }
    }

    /// Check-then-insert under one lock; `make` runs only on a miss.
    pub(crate) fn get_or_insert_hashed(
        &self,
        hash: &str,
        uri: &str,
        make: impl FnOnce() -> AssetHandle,
    ) -> Arc<AssetHandle> {
        let mut maps = self.lock();
        if let Some(existing) = maps.by_hash.get(hash) {
            return Arc::clone(existing);
        }
        let handle = Arc::new(make());
        maps.by_hash.insert(hash.to_string(), Arc::clone(&handle));
        maps.by_uri
            .entry(uri.to_string())
            .or_insert_with(|| Arc::clone(&handle));
        tracing::debug!("registered asset {} ({})", hash, uri);
        handle
    }

    pub(crate) fn get_or_insert_uri(
        &self,
        uri: &str,
        make: impl FnOnce() -> AssetHandle,
    ) -> Arc<AssetHandle> {
        let mut maps = self.lock();
        if let Some(existing) = maps.by_uri.get(uri) {
            return Arc::clone(existing);
        }
        let handle = Arc::new(make());
        maps.by_uri.insert(uri.to_string(), Arc::clone(&handle));
        tracing::debug!("registered asset {}", uri);
        handle
    }

    /// Number of distinct handles.
    pub fn len(&self) -> usize {
        self.handles().len()
    }

    pub fn is_empty(&self) -> bool {
        let maps = self.lock();
        maps.by_hash.is_empty() && maps.by_uri.is_empty()
    }

    /// Distinct handles, each once even when indexed under both keys.
    pub fn handles(&self) -> Vec<Arc<AssetHandle>> {
        let maps = self.lock();
        let mut out: Vec<Arc<AssetHandle>> = maps.by_hash.values().cloned().collect();
        for h in maps.by_uri.values() {
            if !out.iter().any(|o| Arc::ptr_eq(o, h)) {
                out.push(Arc::clone(h));
            }
        }
        out
    }
}
