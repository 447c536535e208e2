//! Image dimension probing for assets served straight from their URI.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Cursor;

use crate::asset::AssetKind;
use crate::config::TransferConfig;
use crate::error::AssetError;
use crate::storage::fetch_bytes;
use crate::uri;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Display name, derived from the URI's file name.
    pub name: String,
}

/// Kinds whose headers the bundled `image` codecs can read.
const DECODABLE_KINDS: &[&str] = &["png", "jpeg", "jpg", "gif", "bmp", "webp"];

#[async_trait]
pub trait ImageProbe: Send + Sync {
    /// Whether `probe` can read dimensions for this kind. Image kinds it
    /// cannot read are served without dimensions instead of failing.
    fn supports(&self, kind: &AssetKind) -> bool {
        kind.is_image()
    }

    async fn probe(&self, uri: &str) -> Result<ImageInfo, AssetError>;
}

/// Reads width/height from an encoded image header.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("read image header")?
        .into_dimensions()
        .context("unsupported or corrupt image")
}

/// Probe that fetches the image with curl (or decodes a `data:` URI).
pub struct CurlImageProbe {
    transfer: TransferConfig,
}

impl CurlImageProbe {
    pub fn new(transfer: TransferConfig) -> Self {
        Self { transfer }
    }

    async fn load(&self, uri: &str) -> Result<Vec<u8>> {
        if uri::is_data_uri(uri) {
            return uri::decode_data_uri(uri);
        }
        let uri = uri.to_string();
        let transfer = self.transfer.clone();
        tokio::task::spawn_blocking(move || fetch_bytes(&uri, &transfer))
            .await
            .context("probe task join")?
    }
}

#[async_trait]
impl ImageProbe for CurlImageProbe {
    fn supports(&self, kind: &AssetKind) -> bool {
        DECODABLE_KINDS
            .iter()
            .any(|k| k.eq_ignore_ascii_case(kind.as_str()))
    }

    async fn probe(&self, uri: &str) -> Result<ImageInfo, AssetError> {
        let bytes = self
            .load(uri)
            .await
            .map_err(|e| AssetError::transfer(uri, e))?;
        let (width, height) =
            image_dimensions(&bytes).map_err(|e| AssetError::transfer(uri, e))?;
        Ok(ImageInfo {
            width,
            height,
            name: uri::filename_from_uri(uri),
        })
    }
}
