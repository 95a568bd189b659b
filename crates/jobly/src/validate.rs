//! Shape checks for request fields that the database cannot express.

use std::sync::OnceLock;

/// Best-effort email validation.
///
/// Not RFC-compliant; rejects whitespace and requires `local@domain.tld`.
pub fn is_email(s: &str) -> bool {
    static EMAIL_RE: OnceLock<regex::Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| {
            regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid built-in email regex")
        })
        .is_match(s)
}

/// Company handles and usernames: 1-25 lowercase letters, digits, `-` or `_`.
pub fn is_slug(s: &str) -> bool {
    static SLUG_RE: OnceLock<regex::Regex> = OnceLock::new();
    SLUG_RE
        .get_or_init(|| regex::Regex::new(r"^[a-z0-9_-]{1,25}$").expect("invalid built-in slug regex"))
        .is_match(s)
}

/// Absolute `http`/`https` URL.
pub fn is_web_url(s: &str) -> bool {
    url::Url::parse(s).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email() {
        assert!(is_email("u1@email.com"));
        assert!(!is_email("u1@email"));
        assert!(!is_email("not an@email.com"));
        assert!(!is_email(""));
    }

    #[test]
    fn slug() {
        assert!(is_slug("anderson-arias"));
        assert!(is_slug("u1"));
        assert!(!is_slug("Acme"));
        assert!(!is_slug(""));
        assert!(!is_slug("a-handle-that-is-far-too-long-for-the-column"));
    }

    #[test]
    fn web_url() {
        assert!(is_web_url("http://c1.img"));
        assert!(is_web_url("https://example.com/logo.png"));
        assert!(!is_web_url("logo.png"));
        assert!(!is_web_url("javascript:alert(1)"));
    }
}
