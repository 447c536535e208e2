//! URI modeling: asset kind and file name derivation.
//!
//! Asset URIs are either regular URLs (http, https, file, or a relative
//! bundle path) or `data:` URIs carrying the payload inline.

mod data;
mod path;
mod sanitize;

pub use data::{base64_mime_subtype, decode_data_uri, is_data_uri};
pub use path::{extension_from_uri, filename_from_uri};
pub use sanitize::sanitize_component;

/// Derives the asset kind tag for a raw URI.
///
/// A `;base64` MIME marker wins over extension parsing, so
/// `data:image/png;base64,AAA` is `png` even though it has no path extension.
/// Otherwise the file extension of the URI path is used (without the dot),
/// which may be empty.
///
/// # Examples
///
/// - `kind_from_uri("https://example.com/logo.PNG")` → `"PNG"`
/// - `kind_from_uri("data:font/ttf;base64,AAEAAA")` → `"ttf"`
pub fn kind_from_uri(uri: &str) -> String {
    base64_mime_subtype(uri).unwrap_or_else(|| extension_from_uri(uri))
}
