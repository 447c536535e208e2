//! Asset references, descriptors and kind tags.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::uri;

/// Image kinds that get dimension probing when running without durable storage.
const IMAGE_KINDS: &[&str] = &["jpeg", "jpg", "gif", "png", "bmp", "webp", "heic"];

/// Type tag of an asset: a file extension or MIME subtype, e.g. `png`, `ttf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKind(String);

impl AssetKind {
    pub fn new(kind: impl Into<String>) -> Self {
        AssetKind(kind.into())
    }

    pub fn from_uri(uri: &str) -> Self {
        AssetKind(uri::kind_from_uri(uri))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive check against the known raster image kinds.
    pub fn is_image(&self) -> bool {
        IMAGE_KINDS.iter().any(|k| k.eq_ignore_ascii_case(&self.0))
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a caller asks the cache for: a registry identifier or a raw URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetRef {
    /// Identifier resolved through the source resolver (manifest id).
    Module(String),
    /// Raw URI, used as-is.
    Uri(String),
}

impl std::str::FromStr for AssetRef {
    type Err = std::convert::Infallible;

    /// Anything that parses as an absolute URI (`https://…`, `file:/…`,
    /// `data:…`) is a URI; everything else, including relative paths, is a
    /// registry identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if url::Url::parse(s).is_ok() {
            Ok(AssetRef::Uri(s.to_string()))
        } else {
            Ok(AssetRef::Module(s.to_string()))
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Module(id) => write!(f, "{}", id),
            AssetRef::Uri(u) => write!(f, "{}", u),
        }
    }
}

/// Concrete source of an asset as produced by a source resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub uri: String,
    /// Content hash of the file at `uri`, lowercase hex.
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}
