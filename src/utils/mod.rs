//! Common utilities and helper functions
//!
//! This module provides shared text helpers used by the publishing targets
//! and the reports.

use regex::Regex;
use std::sync::OnceLock;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Sanitize filename by removing invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    static INVALID_CHARS: OnceLock<Regex> = OnceLock::new();

    let re =
        INVALID_CHARS.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("Invalid regex pattern"));

    re.replace_all(filename, "_").to_string()
}

/// Lowercase a tag and drop everything that is not alphanumeric
pub fn normalize_tag(tag: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();

    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]").expect("Invalid regex pattern"));

    re.replace_all(&tag.to_lowercase(), "").to_string()
}

/// Lowercase slug: whitespace runs become `-`, dots are dropped
pub fn slugify(text: &str) -> String {
    normalize_whitespace(text)
        .to_lowercase()
        .replace(' ', "-")
        .replace('.', "")
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("hello\n\nworld"), "hello world");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("file<name>.txt"), "file_name_.txt");
        assert_eq!(
            sanitize_filename("valid_filename.txt"),
            "valid_filename.txt"
        );
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("Node.js"), "nodejs");
        assert_eq!(normalize_tag("Web Dev"), "webdev");
        assert_eq!(normalize_tag("..."), "");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Online  Reputation"), "online-reputation");
        assert_eq!(slugify("Node.js"), "nodejs");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very long text here", 10), "very lo...");
        assert_eq!(truncate_text("Résumé-driven Rust", 9), "Résumé...");
    }
}
