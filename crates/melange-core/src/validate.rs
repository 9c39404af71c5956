use crate::feed::FeedFetcher;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

static LINK_ID_RE: OnceLock<Regex> = OnceLock::new();
static SCOPE_PATH_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

/// Lowercase letter, then lowercase letters, digits or underscores.
pub const LINK_ID_PATTERN_CORE: &str = r"[a-z][0-9a-z_]*";

/// URL schemes accepted by [`is_url_valid`].
pub const URL_SCHEMES: &[&str] = &["http", "https", "ftp"];

fn link_id_re() -> &'static Regex {
    LINK_ID_RE.get_or_init(|| Regex::new(&format!("^{LINK_ID_PATTERN_CORE}$")).unwrap())
}

fn scope_path_re() -> &'static Regex {
    SCOPE_PATH_RE.get_or_init(|| {
        Regex::new(&format!(
            "^{LINK_ID_PATTERN_CORE}(/{LINK_ID_PATTERN_CORE})*$"
        ))
        .unwrap()
    })
}

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+'\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$").unwrap()
    })
}

pub fn is_link_id_format_valid(link_id: &str) -> bool {
    link_id_re().is_match(link_id)
}

/// Link ids joined by `/`, without a leading or trailing separator.
pub fn is_scope_path_format_valid(scope_path: &str) -> bool {
    scope_path_re().is_match(scope_path)
}

pub fn is_email_valid(email: &str) -> bool {
    email_re().is_match(email)
}

/// An absolute http, https or ftp URL with a host.
pub fn is_url_valid(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            URL_SCHEMES.contains(&parsed.scheme())
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// A valid URL that answers with a feed document.
pub fn is_feed_url_valid(url: &str, fetcher: &dyn FeedFetcher) -> bool {
    if !is_url_valid(url) {
        return false;
    }
    match fetcher.fetch(url) {
        Ok(response) => response.looks_like_feed(),
        Err(e) => {
            tracing::debug!(url, error = %e, "feed url not reachable");
            false
        }
    }
}
