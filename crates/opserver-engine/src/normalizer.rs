//! Steam avatar URL normalization.
//!
//! Older player records carry avatar URLs on the flat `avatars.steamstatic.com`
//! host, which intermittently fails to serve. The same image is reachable under
//! the sharded community path, where the first two hex characters of the
//! content hash form a directory.

use regex::Regex;
use std::sync::LazyLock;

/// Base of the sharded avatar path that legacy URLs are rewritten to.
pub const CURRENT_AVATAR_BASE: &str =
    "https://cdn.akamai.steamstatic.com/steamcommunity/public/images/avatars";

static LEGACY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://avatars\.steamstatic\.com/(?P<hash>[0-9a-fA-F]{40})(?P<suffix>(?:_[A-Za-z]+)?(?:\.[A-Za-z]{3,4})?)(?P<query>\?.*)?$",
    )
    .expect("legacy avatar pattern is valid")
});

static HASH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|/)(?P<hash>[0-9a-fA-F]{40})(?:_[A-Za-z]+)?(?:\.[A-Za-z]{3,4})?(?:\?.*)?$")
        .expect("avatar hash pattern is valid")
});

/// Rewrite a legacy avatar URL onto the current sharded host.
///
/// URLs that do not match the legacy pattern, including ones already on the
/// current host, come back unchanged. Never fails.
pub fn normalize(url: &str) -> String {
    let Some(caps) = LEGACY_RE.captures(url.trim()) else {
        return url.to_string();
    };

    let hash = &caps["hash"];
    let suffix = caps.name("suffix").map_or("", |m| m.as_str());
    let query = caps.name("query").map_or("", |m| m.as_str());

    format!(
        "{}/{}/{}{}{}",
        CURRENT_AVATAR_BASE,
        &hash[..2],
        hash,
        suffix,
        query
    )
}

/// Content hash of an avatar URL on either host pattern.
pub fn extract_hash(url: &str) -> Option<&str> {
    HASH_RE
        .captures(url)
        .and_then(|caps| caps.name("hash"))
        .map(|m| m.as_str())
}
