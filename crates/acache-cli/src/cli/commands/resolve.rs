//! `acache resolve` – show what an asset reference maps to.

use anyhow::Result;
use acache_core::cache::AssetIdentity;
use acache_core::{AssetCache, AssetRef};

pub fn run_resolve(cache: &AssetCache, asset: &str) -> Result<()> {
    let asset_ref: AssetRef = asset.parse()?;
    let handle = cache.resolve(&asset_ref)?;
    let identity = match handle.identity() {
        AssetIdentity::Hash(h) => format!("hash {}", h),
        AssetIdentity::Uri(u) => format!("uri {}", u),
    };
    let state = if handle.is_resolved() {
        "resolved"
    } else {
        "unresolved"
    };
    println!("{:<10} {}", "IDENTITY", identity);
    println!("{:<10} {}", "NAME", handle.name());
    println!("{:<10} {}", "KIND", handle.kind());
    println!("{:<10} {}", "SOURCE", handle.source_uri());
    if let (Some(w), Some(h)) = (handle.width(), handle.height()) {
        println!("{:<10} {}x{}", "SIZE", w, h);
    }
    println!("{:<10} {}", "STATE", state);
    if let Some(loc) = handle.location() {
        println!("{:<10} {}", "LOCATION", loc);
    }
    Ok(())
}
