use super::schema::OpserverConfig;
use std::path::{Path, PathBuf};
use url::Url;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./opserver.yaml
    /// 2. ~/.opserver/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<OpserverConfig, ConfigError> {
        let local_config = PathBuf::from("./opserver.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".opserver").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(OpserverConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<OpserverConfig, ConfigError> {
        info!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let config: OpserverConfig = serde_yaml::from_str(&content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Reject settings avatar resolution cannot run with: zero timeouts,
    /// blank image hosts, a relative fallback or origin, or a flag template
    /// without `{code}`.
    pub fn validate(config: &OpserverConfig) -> Result<(), ConfigError> {
        let probe = &config.probe;
        if probe.direct_timeout_ms == 0 {
            return Err(invalid("probe.direct_timeout_ms", "must be greater than zero"));
        }
        if probe.proxied_timeout_ms == 0 {
            return Err(invalid("probe.proxied_timeout_ms", "must be greater than zero"));
        }

        let sources = &config.sources;
        if sources.image_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(invalid("sources.image_hosts", "entries must not be blank"));
        }
        if Url::parse(&sources.fallback_url).is_err() {
            return Err(invalid(
                "sources.fallback_url",
                format!("'{}' is not an absolute URL", sources.fallback_url),
            ));
        }
        if let Some(origin) = &sources.origin
            && Url::parse(origin).is_err()
        {
            return Err(invalid(
                "sources.origin",
                format!("'{}' is not an absolute URL", origin),
            ));
        }

        if !config.countries.flag_url_template.contains("{code}") {
            return Err(invalid(
                "countries.flag_url_template",
                "must contain the {code} placeholder",
            ));
        }
        Ok(())
    }
}
