use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpserverConfig {
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub countries: CountriesConfig,
}

/// Timing of the sequential probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Per-candidate timeout for the direct CDN candidates.
    #[serde(default = "default_direct_timeout_ms")]
    pub direct_timeout_ms: u64,
    /// Per-candidate timeout once proxies are involved.
    #[serde(default = "default_proxied_timeout_ms")]
    pub proxied_timeout_ms: u64,
    /// How many leading candidates count as direct.
    #[serde(default = "default_direct_attempts")]
    pub direct_attempts: usize,
    /// Pause before candidate `i` is `i * backoff_step_ms`.
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
}

impl ProbeConfig {
    pub fn direct_timeout(&self) -> Duration {
        Duration::from_millis(self.direct_timeout_ms)
    }

    pub fn proxied_timeout(&self) -> Duration {
        Duration::from_millis(self.proxied_timeout_ms)
    }

    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            direct_timeout_ms: default_direct_timeout_ms(),
            proxied_timeout_ms: default_proxied_timeout_ms(),
            direct_attempts: default_direct_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
        }
    }
}

fn default_direct_timeout_ms() -> u64 {
    3000
}

fn default_proxied_timeout_ms() -> u64 {
    6000
}

fn default_direct_attempts() -> usize {
    2
}

fn default_backoff_step_ms() -> u64 {
    150
}

/// Where avatar candidates come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Domains whose images get the full fallback chain. Subdomains match.
    #[serde(default = "default_image_hosts")]
    pub image_hosts: Vec<String>,
    /// Path prefix of the same-origin avatar proxy route.
    #[serde(default = "default_same_origin_proxy")]
    pub same_origin_proxy: String,
    /// Generic proxy endpoint; the encoded image URL is appended.
    #[serde(default = "default_generic_proxy")]
    pub generic_proxy: String,
    /// Image that is known to load.
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
    /// Origin that relative candidate URLs are resolved against.
    #[serde(default)]
    pub origin: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            image_hosts: default_image_hosts(),
            same_origin_proxy: default_same_origin_proxy(),
            generic_proxy: default_generic_proxy(),
            fallback_url: default_fallback_url(),
            origin: None,
        }
    }
}

fn default_image_hosts() -> Vec<String> {
    vec![
        "steamstatic.com".to_string(),
        "akamaihd.net".to_string(),
        "steamcommunity.com".to_string(),
    ]
}

fn default_same_origin_proxy() -> String {
    "/api/steam-avatar".to_string()
}

fn default_generic_proxy() -> String {
    "https://images.weserv.nl/?url=".to_string()
}

fn default_fallback_url() -> String {
    "https://cdn.akamai.steamstatic.com/steamcommunity/public/images/avatars/fe/fef49e7fa7e1997310d705b2a6158ff8dc1cdfeb_full.jpg".to_string()
}

/// Country directory used for flags in team and player listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountriesConfig {
    /// JSON document mapping two-letter codes to country names.
    #[serde(default = "default_codes_url")]
    pub codes_url: String,
    /// Flag image URL; `{code}` is replaced with the lowercase code.
    #[serde(default = "default_flag_url_template")]
    pub flag_url_template: String,
}

impl Default for CountriesConfig {
    fn default() -> Self {
        Self {
            codes_url: default_codes_url(),
            flag_url_template: default_flag_url_template(),
        }
    }
}

fn default_codes_url() -> String {
    "https://flagcdn.com/en/codes.json".to_string()
}

fn default_flag_url_template() -> String {
    "https://flagcdn.com/w40/{code}.png".to_string()
}
