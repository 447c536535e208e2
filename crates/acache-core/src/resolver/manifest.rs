//! Manifest-backed source resolver.
//!
//! A manifest lists assets by id, in TOML (`[[assets]]` tables) or JSON
//! (`{"assets": [...]}`). Entries may provide scaled variants; the variant
//! picked is the first whose scale covers the device pixel ratio, else the
//! largest one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::SourceResolver;
use crate::asset::{AssetDescriptor, AssetKind};
use crate::error::AssetError;

/// One scaled rendition of an asset (e.g. `@2x`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestVariant {
    pub scale: f32,
    pub uri: String,
    #[serde(default)]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub variants: Vec<ManifestVariant>,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    assets: Vec<ManifestEntry>,
}

pub struct ManifestResolver {
    entries: HashMap<String, ManifestEntry>,
    /// Ids in manifest order, for listing.
    order: Vec<String>,
    pixel_ratio: f32,
}

impl ManifestResolver {
    /// Builds a resolver, sorting each entry's variants by scale.
    /// Fails on duplicate ids and on entries with neither `uri` nor variants.
    pub fn new(entries: Vec<ManifestEntry>, pixel_ratio: f32) -> Result<Self> {
        let mut map = HashMap::with_capacity(entries.len());
        let mut order = Vec::with_capacity(entries.len());
        for mut entry in entries {
            if entry.uri.is_none() && entry.variants.is_empty() {
                anyhow::bail!("manifest entry {:?} has no uri and no variants", entry.id);
            }
            entry
                .variants
                .sort_by(|a, b| a.scale.total_cmp(&b.scale));
            if map.contains_key(&entry.id) {
                anyhow::bail!("duplicate manifest entry {:?}", entry.id);
            }
            order.push(entry.id.clone());
            map.insert(entry.id.clone(), entry);
        }
        Ok(Self {
            entries: map,
            order,
            pixel_ratio,
        })
    }

    pub fn from_toml_str(data: &str, pixel_ratio: f32) -> Result<Self> {
        let file: ManifestFile = toml::from_str(data).context("parse TOML manifest")?;
        Self::new(file.assets, pixel_ratio)
    }

    pub fn from_json_str(data: &str, pixel_ratio: f32) -> Result<Self> {
        let file: ManifestFile = serde_json::from_str(data).context("parse JSON manifest")?;
        Self::new(file.assets, pixel_ratio)
    }

    /// Loads a manifest file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: &Path, pixel_ratio: f32) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read manifest {}", path.display()))?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let resolver = if is_json {
            Self::from_json_str(&data, pixel_ratio)
        } else {
            Self::from_toml_str(&data, pixel_ratio)
        }
        .with_context(|| format!("load manifest {}", path.display()))?;
        tracing::debug!(
            "loaded {} manifest entries from {}",
            resolver.order.len(),
            path.display()
        );
        Ok(resolver)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    fn pick_variant<'a>(&self, variants: &'a [ManifestVariant]) -> Option<&'a ManifestVariant> {
        variants
            .iter()
            .find(|v| v.scale >= self.pixel_ratio)
            .or_else(|| variants.last())
    }
}

impl SourceResolver for ManifestResolver {
    fn resolve(&self, id: &str) -> Result<AssetDescriptor, AssetError> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| AssetError::NotFound { id: id.to_string() })?;

        let (uri, hash) = match self.pick_variant(&entry.variants) {
            Some(v) => (v.uri.clone(), v.hash.clone()),
            // `new` guarantees a uri when there are no variants.
            None => (entry.uri.clone().unwrap_or_default(), entry.hash.clone()),
        };

        Ok(AssetDescriptor {
            name: entry.name.clone().unwrap_or_else(|| entry.id.clone()),
            kind: entry.kind.clone(),
            uri,
            hash,
            width: entry.width,
            height: entry.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
        [[assets]]
        id = "logo"
        type = "png"
        width = 64
        height = 32

        [[assets.variants]]
        scale = 3.0
        uri = "https://cdn.example.com/logo@3x.png"
        hash = "c3"

        [[assets.variants]]
        scale = 1.0
        uri = "https://cdn.example.com/logo.png"
        hash = "c1"

        [[assets.variants]]
        scale = 2.0
        uri = "https://cdn.example.com/logo@2x.png"
        hash = "c2"

        [[assets]]
        id = "font"
        name = "Inter"
        type = "ttf"
        uri = "https://cdn.example.com/Inter.ttf"
        hash = "f0"
    "#;

    #[test]
    fn picks_first_variant_covering_ratio() {
        let r = ManifestResolver::from_toml_str(MANIFEST, 1.5).unwrap();
        let d = r.resolve("logo").unwrap();
        assert_eq!(d.uri, "https://cdn.example.com/logo@2x.png");
        assert_eq!(d.hash.as_deref(), Some("c2"));
        assert_eq!(d.name, "logo");
        assert_eq!(d.width, Some(64));
    }

    #[test]
    fn falls_back_to_largest_variant() {
        let r = ManifestResolver::from_toml_str(MANIFEST, 4.0).unwrap();
        assert_eq!(r.resolve("logo").unwrap().hash.as_deref(), Some("c3"));
        let r = ManifestResolver::from_toml_str(MANIFEST, 1.0).unwrap();
        assert_eq!(r.resolve("logo").unwrap().hash.as_deref(), Some("c1"));
    }

    #[test]
    fn plain_entry_and_listing_order() {
        let r = ManifestResolver::from_toml_str(MANIFEST, 1.0).unwrap();
        let d = r.resolve("font").unwrap();
        assert_eq!(d.name, "Inter");
        assert_eq!(d.kind.as_str(), "ttf");
        let ids: Vec<_> = r.entries().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["logo", "font"]);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let r = ManifestResolver::from_toml_str(MANIFEST, 1.0).unwrap();
        assert_eq!(
            r.resolve("nope").unwrap_err(),
            AssetError::NotFound { id: "nope".into() }
        );
    }

    #[test]
    fn json_manifest() {
        let r = ManifestResolver::from_json_str(
            r#"{"assets":[{"id":"a","type":"gif","uri":"https://e.com/a.gif"}]}"#,
            2.0,
        )
        .unwrap();
        let d = r.resolve("a").unwrap();
        assert!(d.hash.is_none());
        assert!(d.kind.is_image());
    }

    #[test]
    fn rejects_bad_entries() {
        assert!(ManifestResolver::from_json_str(
            r#"{"assets":[{"id":"a","type":"gif"}]}"#,
            1.0
        )
        .is_err());
        assert!(ManifestResolver::from_json_str(
            r#"{"assets":[{"id":"a","type":"gif","uri":"x"},{"id":"a","type":"gif","uri":"y"}]}"#,
            1.0
        )
        .is_err());
    }

    #[test]
    fn load_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("assets.toml");
        std::fs::write(&toml_path, MANIFEST).unwrap();
        assert_eq!(ManifestResolver::load(&toml_path, 1.0).unwrap().entries().count(), 2);

        let json_path = dir.path().join("assets.json");
        std::fs::write(
            &json_path,
            r#"{"assets":[{"id":"a","type":"png","uri":"https://e.com/a.png"}]}"#,
        )
        .unwrap();
        assert_eq!(ManifestResolver::load(&json_path, 1.0).unwrap().entries().count(), 1);
    }
}
