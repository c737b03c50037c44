//! Character encoding detection for raw HTML input
//!
//! The converter accepts raw bytes, so the charset has to be settled before
//! html5ever sees the document. Detection follows a three-level cascade:
//!
//! 1. **Content-Type value**: charset parameter supplied by the caller
//! 2. **HTML meta tags**: `<meta charset>` or `<meta http-equiv="Content-Type">`
//! 3. **Default to UTF-8**: if both fail
//!
//! # Examples
//!
//! ```rust
//! use wordml_converter::charset::detect_charset;
//!
//! let charset = detect_charset(Some("text/html; charset=ISO-8859-1"), b"<html></html>");
//! assert_eq!(charset, "ISO-8859-1");
//!
//! let html = b"<html><head><meta charset=\"UTF-8\"></head></html>";
//! assert_eq!(detect_charset(None, html), "UTF-8");
//!
//! assert_eq!(detect_charset(None, b"<p>no charset</p>"), "UTF-8");
//! ```

use regex::Regex;
use std::sync::OnceLock;

/// Default charset when detection fails
const DEFAULT_CHARSET: &str = "UTF-8";

/// Maximum bytes to scan for meta charset tags
const META_SCAN_LIMIT: usize = 1024;

/// Detect character encoding using the three-level cascade
///
/// Always returns a charset name, defaulting to "UTF-8". Names are
/// normalized to uppercase so downstream comparisons stay consistent.
pub fn detect_charset(content_type: Option<&str>, html: &[u8]) -> String {
    if let Some(ct) = content_type
        && let Some(charset) = charset_parameter(ct)
    {
        return charset.to_ascii_uppercase();
    }

    if let Some(charset) = charset_from_meta(html) {
        return charset.to_ascii_uppercase();
    }

    DEFAULT_CHARSET.to_string()
}

/// Extract the charset parameter from a Content-Type style value
///
/// Accepts `charset=VALUE` and `charset="VALUE"`, with or without
/// surrounding whitespace, anywhere in the parameter list.
fn charset_parameter(content_type: &str) -> Option<String> {
    static CHARSET_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex =
        CHARSET_REGEX.get_or_init(|| Regex::new(r#"(?i)charset\s*=\s*"?([^";,\s]+)"?"#).ok());
    let regex = regex.as_ref()?;

    regex
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Scan the document head for a meta charset declaration
///
/// Handles both the HTML5 form (`<meta charset="...">`) and the HTML4 form
/// (`<meta http-equiv="Content-Type" content="...; charset=...">`). Only the
/// first `META_SCAN_LIMIT` bytes are scanned; meta charset tags are required
/// to appear early in the document.
fn charset_from_meta(html: &[u8]) -> Option<String> {
    let scan_limit = std::cmp::min(html.len(), META_SCAN_LIMIT);
    let head = String::from_utf8_lossy(&html[..scan_limit]);

    static META5_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let meta5 = META5_REGEX
        .get_or_init(|| Regex::new(r#"(?i)<meta\s+charset\s*=\s*["']?([^"'>\s]+)["']?"#).ok());
    if let Some(regex) = meta5.as_ref()
        && let Some(caps) = regex.captures(&head)
        && let Some(m) = caps.get(1)
    {
        return Some(m.as_str().to_string());
    }

    static META4_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let meta4 = META4_REGEX.get_or_init(|| {
        Regex::new(
            r#"(?i)<meta\s+http-equiv\s*=\s*["']?content-type["']?\s+content\s*=\s*["'][^"']*charset=([^"'>\s;]+)"#,
        )
        .ok()
    });
    if let Some(regex) = meta4.as_ref()
        && let Some(caps) = regex.captures(&head)
        && let Some(m) = caps.get(1)
    {
        return Some(m.as_str().to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_charset() {
        let charset = detect_charset(Some("text/html; charset=utf-8"), b"");
        assert_eq!(charset, "UTF-8");
    }

    #[test]
    fn test_content_type_quoted_charset() {
        let charset = detect_charset(Some("text/html; charset=\"ISO-8859-1\""), b"");
        assert_eq!(charset, "ISO-8859-1");
    }

    #[test]
    fn test_content_type_without_charset_falls_through() {
        let html = b"<html><head><meta charset=\"windows-1252\"></head></html>";
        let charset = detect_charset(Some("text/html"), html);
        assert_eq!(charset, "WINDOWS-1252");
    }

    #[test]
    fn test_html5_meta_charset() {
        let html = b"<html><head><meta charset=\"UTF-8\"></head><body></body></html>";
        assert_eq!(detect_charset(None, html), "UTF-8");
    }

    #[test]
    fn test_html4_meta_http_equiv() {
        let html =
            b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\">";
        assert_eq!(detect_charset(None, html), "ISO-8859-1");
    }

    #[test]
    fn test_content_type_takes_priority_over_meta() {
        let html = b"<html><head><meta charset=\"ISO-8859-1\"></head></html>";
        let charset = detect_charset(Some("text/html; charset=UTF-8"), html);
        assert_eq!(charset, "UTF-8");
    }

    #[test]
    fn test_default_utf8() {
        assert_eq!(detect_charset(None, b"<p>plain</p>"), "UTF-8");
    }

    #[test]
    fn test_meta_beyond_scan_limit_ignored() {
        let mut html = vec![b' '; META_SCAN_LIMIT];
        html.extend_from_slice(b"<meta charset=\"ISO-8859-1\">");
        assert_eq!(detect_charset(None, &html), "UTF-8");
    }
}
