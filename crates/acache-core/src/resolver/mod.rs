//! Source resolver interface: turns registry identifiers into concrete sources.
//!
//! The cache only depends on this trait and does not know where asset
//! metadata comes from (a manifest file, a host registry, a test fixture).

mod manifest;

pub use manifest::{ManifestEntry, ManifestResolver, ManifestVariant};

use crate::asset::AssetDescriptor;
use crate::error::AssetError;

/// Maps an opaque asset identifier to a URI plus metadata.
///
/// Lookups are synchronous: they never touch the network.
pub trait SourceResolver: Send + Sync {
    /// Fails with [`AssetError::NotFound`] if `id` is unknown.
    fn resolve(&self, id: &str) -> Result<AssetDescriptor, AssetError>;
}
