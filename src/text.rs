//! Character-safe string helpers

/// Truncate to at most `max_chars` characters on a char boundary
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate at a character boundary, appending "..." only when something was cut
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let truncated = truncate_chars(s, max_chars);
    if truncated.len() < s.len() {
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}
