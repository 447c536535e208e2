//! `acache path` – best currently-known source for an asset.

use anyhow::Result;
use acache_core::{AssetCache, AssetRef};

/// Resolves without downloading; prints the local URI if the asset is already
/// cached or embedded, else its source URI.
pub fn run_path(cache: &AssetCache, asset: &str) -> Result<()> {
    let asset_ref: AssetRef = asset.parse()?;
    let handle = cache.resolve(&asset_ref)?;
    println!("{}", cache.render_uri(&handle));
    Ok(())
}
