//! `data:` URI helpers.

use anyhow::{Context, Result};
use base64::Engine;

const BASE64_MARKER: &str = ";base64";

pub fn is_data_uri(uri: &str) -> bool {
    uri.get(..5)
        .map(|p| p.eq_ignore_ascii_case("data:"))
        .unwrap_or(false)
}

/// MIME subtype of a base64 URI (`data:image/png;base64,...` -> `png`).
///
/// Returns `None` when the URI carries no `;base64` marker. A marker without a
/// `type/subtype` pair yields an empty subtype.
pub fn base64_mime_subtype(uri: &str) -> Option<String> {
    if !uri.contains(BASE64_MARKER) {
        return None;
    }
    let media = uri.split(';').next().unwrap_or("");
    Some(media.split('/').nth(1).unwrap_or("").to_string())
}

/// Decodes the payload of a `data:` URI. Base64 payloads are decoded; other
/// payloads are returned verbatim.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    if !is_data_uri(uri) {
        anyhow::bail!("not a data URI");
    }
    let (header, payload) = uri[5..]
        .split_once(',')
        .context("data URI has no ',' separator")?;
    if header.ends_with(BASE64_MARKER) {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .context("invalid base64 payload in data URI")
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtype_from_marker() {
        assert_eq!(
            base64_mime_subtype("data:image/png;base64,AAA").as_deref(),
            Some("png")
        );
        assert_eq!(
            base64_mime_subtype("data:font/ttf;charset=x;base64,AAA").as_deref(),
            Some("ttf")
        );
        assert_eq!(base64_mime_subtype("data:;base64,AAA").as_deref(), Some(""));
        assert_eq!(base64_mime_subtype("https://example.com/a.png"), None);
    }

    #[test]
    fn decode_base64_and_plain() {
        assert_eq!(decode_data_uri("data:text/plain;base64,aGk=").unwrap(), b"hi");
        assert_eq!(decode_data_uri("DATA:text/plain,hello").unwrap(), b"hello");
        assert!(decode_data_uri("data:text/plain;base64").is_err());
        assert!(decode_data_uri("https://example.com/").is_err());
    }
}
