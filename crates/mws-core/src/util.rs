//! Small helpers shared by the engine and the binaries.

/// Trimmed copy of `value`, or `None` when nothing but whitespace remains.
pub fn non_empty_trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Single-line excerpt of a response body, at most 180 characters.
pub fn compact_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(180)
        .collect()
}

/// Current Unix timestamp in milliseconds.
pub fn unix_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_trimmed_drops_blank_values() {
        assert_eq!(non_empty_trimmed(" \t\n"), None);
        assert_eq!(
            non_empty_trimmed(" http://localhost:1337 "),
            Some("http://localhost:1337".to_string())
        );
    }

    #[test]
    fn is_http_url_accepts_valid_schemes() {
        assert!(is_http_url("http://localhost"));
        assert!(is_http_url("https://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("localhost:1337"));
    }

    #[test]
    fn compact_text_flattens_and_truncates() {
        assert_eq!(compact_text("  not\n  found  "), "not found");
        assert_eq!(compact_text(&"x".repeat(500)).len(), 180);
    }
}
