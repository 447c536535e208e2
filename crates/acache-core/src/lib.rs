pub mod config;
pub mod logging;

pub mod asset;
pub mod cache;
pub mod checksum;
pub mod error;
pub mod probe;
pub mod resolver;
pub mod storage;
pub mod uri;

pub use asset::{AssetDescriptor, AssetKind, AssetRef};
pub use cache::{AssetCache, AssetHandle, CacheOptions, Location};
pub use error::AssetError;
