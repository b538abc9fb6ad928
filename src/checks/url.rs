//! URL syntax check and scheme normalization.

use std::sync::LazyLock;

use regex::Regex;

static URL_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:http|ftp)s?://",
        r"(?:",
        r"(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)",
        r"|localhost",
        r"|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}",
        r"|\[?[A-F0-9]*:[A-F0-9:]+\]?",
        r")",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("Invalid URL regex")
});

static LEADING_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("Invalid scheme regex"));

/// Scheme assumed for bare host names like `example.com`.
pub const DEFAULT_SCHEME: &str = "http://";

/// Scheme prefix of `value` including `://`, if it starts with one.
///
/// Only a leading scheme counts; `://` inside a path or query does not.
fn leading_scheme(value: &str) -> Option<&str> {
    LEADING_SCHEME.find(value).map(|m| m.as_str())
}

/// Trim and prepend [`DEFAULT_SCHEME`] unless the value already has one.
pub fn with_default_scheme(value: &str) -> String {
    let value = value.trim();
    if leading_scheme(value).is_some() {
        value.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{value}")
    }
}

/// http(s)/ftp(s) URL with a host name, `localhost`, IPv4 or IPv6 literal,
/// optional port and optional path or query.
pub fn is_valid_url_syntax(url: &str) -> bool {
    URL_SYNTAX.is_match(url)
}

/// Replace whatever scheme the value has (or lacks) with `https://`.
pub fn force_secure_scheme(value: &str) -> String {
    let value = value.trim();
    let rest = leading_scheme(value).map_or(value, |scheme| &value[scheme.len()..]);
    format!("https://{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_forms() {
        for url in [
            "http://example.com",
            "https://www.example.co.uk/path/to?q=1",
            "ftp://files.example.org/pub",
            "ftps://files.example.org",
            "http://localhost:8080/health",
            "http://192.168.0.1",
            "http://[::1]:80/",
            "HTTPS://EXAMPLE.COM",
        ] {
            assert!(is_valid_url_syntax(url), "{url}");
        }
    }

    #[test]
    fn rejects_junk() {
        for url in [
            "http://not a url",
            "http://",
            "gopher://example.com",
            "http://example",
            "http://-bad-.com",
            "example.com",
        ] {
            assert!(!is_valid_url_syntax(url), "{url}");
        }
    }

    #[test]
    fn default_scheme_only_when_missing() {
        assert_eq!(with_default_scheme(" example.com "), "http://example.com");
        assert_eq!(with_default_scheme("ftp://x.org"), "ftp://x.org");
    }

    #[test]
    fn embedded_url_is_not_a_scheme() {
        let value = "example.com/login?next=https://example.com/home";
        assert_eq!(
            with_default_scheme(value),
            "http://example.com/login?next=https://example.com/home"
        );
        assert!(is_valid_url_syntax(&with_default_scheme(value)));
        assert_eq!(
            force_secure_scheme("shop.example/r?u=ftp://evil.example/"),
            "https://shop.example/r?u=ftp://evil.example/"
        );
        assert_eq!(
            force_secure_scheme("http://shop.example/r?u=ftp://evil.example/"),
            "https://shop.example/r?u=ftp://evil.example/"
        );
    }

    #[test]
    fn secure_scheme_forced() {
        assert_eq!(force_secure_scheme("http://example.com/a"), "https://example.com/a");
        assert_eq!(force_secure_scheme("example.com"), "https://example.com");
        assert_eq!(force_secure_scheme("https://example.com"), "https://example.com");
    }
}
