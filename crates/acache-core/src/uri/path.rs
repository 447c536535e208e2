//! File name and extension extraction from asset URIs.

use url::Url;

/// Parses `uri`, accepting relative references (resolved against `file:///`).
fn parse_lenient(uri: &str) -> Option<Url> {
    match Url::parse(uri) {
        Ok(u) => Some(u),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse("file:///").ok()?;
            base.join(uri).ok()
        }
        Err(_) => None,
    }
}

/// Last path segment of the URI, percent-encoding left as-is. Query and fragment
/// are ignored. Returns an empty string for root, opaque or unparseable URIs.
pub fn filename_from_uri(uri: &str) -> String {
    let Some(parsed) = parse_lenient(uri) else {
        return String::new();
    };
    // data:, mailto: and friends have no path segments.
    if parsed.cannot_be_a_base() {
        return String::new();
    }
    let path = parsed.path();
    match path.rfind('/') {
        Some(i) => path[i + 1..].to_string(),
        None => path.to_string(),
    }
}

/// Extension of the URI's file name without the leading dot, or empty.
/// A leading dot alone (`.hidden`) is not an extension.
pub fn extension_from_uri(uri: &str) -> String {
    let name = filename_from_uri(uri);
    match name.rfind('.') {
        Some(i) if i > 0 => name[i + 1..].to_string(),
        _ => String::new(),
    }
}
