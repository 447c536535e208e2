//! `acache list` – list manifest entries.

use anyhow::Result;
use acache_core::config::AcacheConfig;
use acache_core::resolver::ManifestResolver;

pub fn run_list(cfg: &AcacheConfig) -> Result<()> {
    let Some(path) = &cfg.manifest else {
        println!("No manifest configured.");
        return Ok(());
    };
    let resolver = ManifestResolver::load(path, cfg.pixel_ratio)?;
    let mut any = false;
    for entry in resolver.entries() {
        if !any {
            println!("{:<20} {:<6} {:<34} {}", "ID", "TYPE", "HASH", "URI");
            any = true;
        }
        let uri = entry
            .uri
            .clone()
            .or_else(|| entry.variants.first().map(|v| v.uri.clone()))
            .unwrap_or_default();
        println!(
            "{:<20} {:<6} {:<34} {}",
            entry.id,
            entry.kind,
            entry.hash.as_deref().unwrap_or("-"),
            uri
        );
    }
    if !any {
        println!("Manifest {} is empty.", path.display());
    }
    Ok(())
}
