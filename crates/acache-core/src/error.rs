//! Errors surfaced by the asset cache.
//!
//! `AssetError` is `Clone` because one outcome is delivered to every caller
//! waiting on the same in-flight download.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The identifier is not known to the source resolver. Not retried.
    #[error("asset \"{id}\" is missing from the asset registry")]
    NotFound { id: String },

    /// Downloaded bytes do not hash to the expected content hash.
    #[error("downloaded file for asset '{name}' located at {uri} failed integrity check (expected {expected}, got {actual})")]
    Integrity {
        name: String,
        uri: String,
        expected: String,
        actual: String,
    },

    /// Network or storage failure reported by a backend.
    #[error("transfer of {uri} failed: {reason}")]
    Transfer { uri: String, reason: String },
}

impl AssetError {
    /// Wraps a backend failure, keeping the whole context chain in `reason`.
    pub fn transfer(uri: impl Into<String>, err: anyhow::Error) -> Self {
        AssetError::Transfer {
            uri: uri.into(),
            reason: format!("{:#}", err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AssetError::NotFound { .. })
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, AssetError::Integrity { .. })
    }
}
