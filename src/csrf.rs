//! CSRF token discovery.
//!
//! The session service expects the token it handed out in the `csrftoken`
//! cookie to be echoed back in the `X-CSRFToken` header. When no cookie is
//! available, a token rendered into an HTML page as
//! `<meta name="csrf-token" content="...">` is accepted instead.

use once_cell::sync::Lazy;
use regex::Regex;

/// Name of the cookie carrying the token.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Header the token is sent back in (`X-CSRFToken`; header names are
/// case-insensitive and stored lowercase).
pub const CSRF_HEADER: &str = "x-csrftoken";

static META_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s[^>]*name\s*=\s*["']csrf-token["'][^>]*>"#)
        .expect("meta tag pattern should compile")
});

static CONTENT_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)content\s*=\s*["']([^"']*)["']"#)
        .expect("content attribute pattern should compile")
});

/// Extracts the CSRF token from a `Cookie`-style header value
/// (`name=value; other=value`).
///
/// Returns `None` when the cookie is missing or empty.
pub fn token_from_cookie_header(cookies: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CSRF_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Extracts the CSRF token from the `csrf-token` meta tag of an HTML page.
pub fn token_from_meta(html: &str) -> Option<String> {
    let tag = META_TAG.find(html)?;
    CONTENT_ATTR
        .captures(tag.as_str())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}
