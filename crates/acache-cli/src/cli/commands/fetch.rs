//! `acache fetch` – make assets available locally.

use anyhow::Result;
use acache_core::{AssetCache, AssetRef};

pub async fn run_fetch(cache: &AssetCache, assets: &[String]) -> Result<()> {
    let refs = assets
        .iter()
        .map(|a| a.parse::<AssetRef>())
        .collect::<Result<Vec<_>, _>>()?;
    let handles = cache.load_many(&refs).await?;
    for (asset, handle) in assets.iter().zip(&handles) {
        let location = handle
            .location()
            .map(|l| l.to_string())
            .unwrap_or_else(|| handle.source_uri().to_string());
        println!("{}  {}", location, asset);
    }
    tracing::info!("fetched {} asset(s)", handles.len());
    Ok(())
}
