//! Decides which URLs are worth tracking and which host they belong to.

use url::Url;

/// Hostname used when a URL can't be parsed or has no host.
pub const UNKNOWN_HOST: &str = "unknown";

/// Browser internal pages, extension pages, local files and inline content. Time spent there is
/// never attributed to a site.
pub const EXCLUDED_PREFIXES: [&str; 9] = [
    "chrome://",
    "chrome-extension://",
    "edge://",
    "firefox://",
    "about:",
    "moz-extension://",
    "file://",
    "data:",
    "javascript:",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlClass {
    pub excluded: bool,
    pub hostname: String,
}

pub fn classify(url: &str) -> UrlClass {
    UrlClass {
        excluded: is_excluded(url),
        hostname: hostname_of(url),
    }
}

pub fn is_excluded(url: &str) -> bool {
    EXCLUDED_PREFIXES
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// Host component of `url` with a single leading `www.` removed.
pub fn hostname_of(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return UNKNOWN_HOST.into();
    };
    match parsed.host_str() {
        Some(host) if !host.is_empty() => host.strip_prefix("www.").unwrap_or(host).to_string(),
        _ => UNKNOWN_HOST.into(),
    }
}
