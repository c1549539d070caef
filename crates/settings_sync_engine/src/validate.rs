//! Structural validators shared by the section rules.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Returns true for an absolute `http`/`https` URL with a host.
pub fn valid_url(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    match Url::parse(value) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().map(|h| !h.is_empty()).unwrap_or(false)
        }
        Err(_) => false,
    }
}

/// Returns true for `local@domain.tld` with no whitespace.
pub fn valid_email(value: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("valid email regex")
    });
    re.is_match(value.trim())
}

/// Returns true for a non-empty, non-zero decimal port number.
pub fn valid_port(value: &str) -> bool {
    matches!(value.trim().parse::<u16>(), Ok(port) if port != 0)
}
