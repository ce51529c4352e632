//! Candidate list construction for avatar sources.

use crate::config::SourcesConfig;
use crate::normalizer::normalize;
use opserver_common::protocol::{Candidate, Strategy};
use url::Url;

const SIZE_TAGS: [&str; 2] = ["_medium", "_small"];
const FULL_TAG: &str = "_full";

/// Builds the ordered list of URLs to probe for one avatar source.
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
    sources: SourcesConfig,
}

impl CandidateBuilder {
    pub fn new(sources: SourcesConfig) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &SourcesConfig {
        &self.sources
    }

    /// Candidates in priority order.
    ///
    /// An absent or blank source yields nothing. A source outside the known
    /// image hosts yields itself alone. The `Direct` and `Original`
    /// candidates carry the source exactly as given; surrounding whitespace
    /// is only ignored when deriving the other URLs.
    pub fn build(&self, source: Option<&str>) -> Vec<Candidate> {
        let Some(source) = source.filter(|s| !s.trim().is_empty()) else {
            return Vec::new();
        };
        let trimmed = source.trim();

        if !self.is_image_host(trimmed) {
            return vec![Candidate::new(Strategy::Direct, source)];
        }

        let normalized = normalize(trimmed);

        let mut candidates = vec![
            Candidate::new(Strategy::HighQuality, high_quality(&normalized)),
            Candidate::new(Strategy::Normalized, normalized.clone()),
        ];
        // pathless URLs have nothing for the proxy to look up
        if let Some(proxy) = self.same_origin_proxy(trimmed) {
            candidates.push(Candidate::new(Strategy::SameOriginProxy, proxy));
        }
        candidates.extend([
            Candidate::new(Strategy::Original, source),
            Candidate::new(Strategy::GenericProxy, self.generic_proxy(&normalized)),
            Candidate::new(Strategy::StaticFallback, self.sources.fallback_url.clone()),
        ]);
        candidates
    }

    /// Whether `url` is served by one of the configured image hosts.
    pub fn is_image_host(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        self.sources.image_hosts.iter().any(|domain| {
            let domain = domain.trim_start_matches('.').to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        })
    }

    fn same_origin_proxy(&self, source: &str) -> Option<String> {
        let segment = last_segment(source)?;
        let prefix = self.sources.same_origin_proxy.trim_end_matches('/');
        Some(format!("{}/{}", prefix, segment))
    }

    fn generic_proxy(&self, normalized: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(normalized.as_bytes()).collect();
        format!("{}{}", self.sources.generic_proxy, encoded)
    }
}

impl Default for CandidateBuilder {
    fn default() -> Self {
        Self::new(SourcesConfig::default())
    }
}

/// Build candidates with the default source configuration.
pub fn build_candidates(source: Option<&str>) -> Vec<Candidate> {
    CandidateBuilder::default().build(source)
}

/// Swap the size tag in the file name for the full-size one, or add it
/// before the extension. Query and fragment are left alone.
fn high_quality(url: &str) -> String {
    let path_end = url.find(['?', '#']).unwrap_or(url.len());
    let name_start = url[..path_end].rfind('/').map_or(0, |i| i + 1);
    if url[..name_start].ends_with("//") {
        return url.to_string();
    }
    let name = &url[name_start..path_end];

    for tag in SIZE_TAGS {
        if let Some(pos) = name.rfind(tag) {
            let at = name_start + pos;
            return format!("{}{}{}", &url[..at], FULL_TAG, &url[at + tag.len()..]);
        }
    }

    if name.contains(FULL_TAG) {
        return url.to_string();
    }

    // bare "<hash>.jpg"
    match name.rfind('.') {
        Some(dot) => {
            let at = name_start + dot;
            format!("{}{}{}", &url[..at], FULL_TAG, &url[at..])
        }
        None => url.to_string(),
    }
}

/// Last non-empty path segment, or `None` for a pathless URL.
fn last_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_quality_replaces_size_tag() {
        assert_eq!(high_quality("https://h/x/abc_medium.jpg"), "https://h/x/abc_full.jpg");
        assert_eq!(high_quality("https://h/x/abc_small.jpg"), "https://h/x/abc_full.jpg");
        assert_eq!(high_quality("https://h/x/abc_full.jpg"), "https://h/x/abc_full.jpg");
    }

    #[test]
    fn test_high_quality_inserts_tag_before_extension() {
        assert_eq!(high_quality("https://h/x/abc.jpg?v=1"), "https://h/x/abc_full.jpg?v=1");
        assert_eq!(high_quality("https://h/x/abc"), "https://h/x/abc");
    }

    #[test]
    fn test_high_quality_leaves_query_alone() {
        assert_eq!(
            high_quality("https://h/x/abc.jpg?s=_small"),
            "https://h/x/abc_full.jpg?s=_small"
        );
        assert_eq!(
            high_quality("https://h/x/abc_medium.jpg?s=_small#_medium"),
            "https://h/x/abc_full.jpg?s=_small#_medium"
        );
        assert_eq!(high_quality("https://h/x/abc.jpg?v=_full"), "https://h/x/abc_full.jpg?v=_full");
    }

    #[test]
    fn test_last_segment_ignores_query_and_trailing_slash() {
        assert_eq!(last_segment("https://h/a/b/c.jpg?x=1").as_deref(), Some("c.jpg"));
        assert_eq!(last_segment("https://h/a/b/").as_deref(), Some("b"));
        assert_eq!(last_segment("https://avatars.steamstatic.com/"), None);
        assert_eq!(last_segment("https://avatars.steamstatic.com"), None);
    }

    #[test]
    fn test_subdomains_are_image_hosts() {
        let builder = CandidateBuilder::default();
        assert!(builder.is_image_host("https://avatars.steamstatic.com/a.jpg"));
        assert!(builder.is_image_host("https://steamcdn-a.akamaihd.net/a.jpg"));
        assert!(!builder.is_image_host("https://notsteamstatic.com/a.jpg"));
        assert!(!builder.is_image_host("/relative/a.jpg"));
    }
}
