use serde::{Deserialize, Serialize};
use std::fmt;

/// The way a candidate URL was derived from the avatar source.
///
/// Variants are listed in the order the strategy list builder emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Normalized URL forced to the largest size variant.
    HighQuality,
    /// Normalized URL at the size the source asked for.
    Normalized,
    /// Same-origin image proxy keyed by the last path segment.
    SameOriginProxy,
    /// The source URL, untouched.
    Original,
    /// Third-party image proxy fed with the normalized URL.
    GenericProxy,
    /// Known-good static image.
    StaticFallback,
    /// Source that is not hosted on a known image CDN.
    Direct,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::HighQuality => "high-quality",
            Strategy::Normalized => "normalized",
            Strategy::SameOriginProxy => "proxy",
            Strategy::Original => "original",
            Strategy::GenericProxy => "generic-proxy",
            Strategy::StaticFallback => "fallback",
            Strategy::Direct => "direct",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One URL to try, tagged with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub strategy: Strategy,
    pub url: String,
}

impl Candidate {
    pub fn new(strategy: Strategy, url: impl Into<String>) -> Self {
        Self {
            strategy,
            url: url.into(),
        }
    }
}

/// Terminal outcome of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ResolutionResult {
    Resolved(Candidate),
    Exhausted,
}

impl ResolutionResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionResult::Resolved(_))
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ResolutionResult::Resolved(candidate) => Some(&candidate.url),
            ResolutionResult::Exhausted => None,
        }
    }
}

/// What a consuming view should draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RenderState {
    /// Placeholder while candidates are being probed.
    Loading,
    /// Draw the image at `url`.
    Succeeded { url: String, strategy: Strategy },
    /// Draw `glyph` instead of an image. Needs no network.
    Exhausted { glyph: String },
}

impl RenderState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RenderState::Loading)
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, RenderState::Succeeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_state_serializes_with_state_tag() {
        let state = RenderState::Succeeded {
            url: "https://example.com/a.jpg".into(),
            strategy: Strategy::SameOriginProxy,
        };
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "state": "succeeded",
                "url": "https://example.com/a.jpg",
                "strategy": "same_origin_proxy"
            })
        );

        let exhausted = RenderState::Exhausted { glyph: "K".into() };
        assert_eq!(
            serde_json::to_value(&exhausted).unwrap(),
            json!({ "state": "exhausted", "glyph": "K" })
        );
    }

    #[test]
    fn test_strategy_labels_are_distinct() {
        let all = [
            Strategy::HighQuality,
            Strategy::Normalized,
            Strategy::SameOriginProxy,
            Strategy::Original,
            Strategy::GenericProxy,
            Strategy::StaticFallback,
            Strategy::Direct,
        ];
        let mut labels: Vec<_> = all.iter().map(|s| s.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), all.len());
    }

    #[test]
    fn test_resolution_result_url() {
        let resolved = ResolutionResult::Resolved(Candidate::new(Strategy::Direct, "u"));
        assert_eq!(resolved.url(), Some("u"));
        assert!(resolved.is_resolved());
        assert_eq!(ResolutionResult::Exhausted.url(), None);
    }
}
