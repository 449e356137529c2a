// src/utils/url.rs

//! URL manipulation utilities.

use std::sync::LazyLock;

use regex::Regex;

/// Leading dots followed by a slash: `./x`, `../x`, `/x`, `//host/x`.
static PATH_LIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.*/").unwrap());

/// Any `scheme:` prefix.
static SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+?:").unwrap());

/// `//host` or `scheme://host`.
static AUTHORITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:\w+?:)?//").unwrap());

/// Make a roster photo link absolute by prefixing `https://`.
///
/// Links that are already absolute, path-like, or protocol-relative are
/// returned trimmed but otherwise unchanged. `localhost:port` is not a scheme.
///
/// # Examples
/// ```
/// use leaderboard_sync::utils::url::prepend_https;
///
/// assert_eq!(prepend_https("cdn.example.com/a.png"), "https://cdn.example.com/a.png");
/// assert_eq!(prepend_https("http://cdn.example.com/a.png"), "http://cdn.example.com/a.png");
/// assert_eq!(prepend_https("./a.png"), "./a.png");
/// ```
pub fn prepend_https(url: &str) -> String {
    let url = url.trim();

    if PATH_LIKE.is_match(url) || (SCHEME.is_match(url) && !url.starts_with("localhost")) {
        return url.to_string();
    }
    if AUTHORITY.is_match(url) {
        return url.to_string();
    }

    format!("https://{url}")
}

/// Whether a source string should be tried as a network location.
pub fn is_remote(source: &str) -> bool {
    url::Url::parse(source.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
