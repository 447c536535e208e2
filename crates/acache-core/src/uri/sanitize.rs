//! Sanitization of URI-derived fragments before they become part of a cache path.

/// Makes `name` safe to embed in a single Linux path component.
///
/// - Replaces NUL, `/`, `\`, whitespace and control characters with `_`
/// - Trims leading/trailing dots and underscores
/// - Collapses consecutive underscores
/// - Limits length to 255 bytes (Linux NAME_MAX)
pub fn sanitize_component(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let c = if c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace() {
            '_'
        } else {
            c
        };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}
