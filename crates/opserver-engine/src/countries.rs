//! Country names and flags for the team and player directories.
//!
//! The code-to-name table is fetched once per process and shared. It stays
//! cached until [`CountryDirectory::invalidate`] is called; a failed fetch is
//! not cached, so the next lookup tries again.

use crate::config::CountriesConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

pub type CountryTable = HashMap<String, String>;

#[derive(Debug, Clone, Error)]
pub enum CountryError {
    #[error("Failed to fetch country codes: {0}")]
    Fetch(String),
    #[error("Country code document is malformed: {0}")]
    Malformed(String),
}

/// Where the code table comes from.
#[async_trait]
pub trait CountrySource: Send + Sync {
    async fn fetch(&self) -> Result<CountryTable, CountryError>;
}

/// Fetches a `{"us": "United States", ...}` document over HTTP.
pub struct HttpCountrySource {
    client: reqwest::Client,
    url: String,
}

impl HttpCountrySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &CountriesConfig) -> Self {
        Self::new(config.codes_url.clone())
    }
}

#[async_trait]
impl CountrySource for HttpCountrySource {
    async fn fetch(&self) -> Result<CountryTable, CountryError> {
        info!("Fetching country codes from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CountryError::Fetch(e.to_string()))?;

        response
            .json::<CountryTable>()
            .await
            .map_err(|e| CountryError::Malformed(e.to_string()))
    }
}

static GLOBAL: LazyLock<CountryDirectory> = LazyLock::new(CountryDirectory::new);

/// Lazily loaded code table.
pub struct CountryDirectory {
    table: RwLock<Option<Arc<CountryTable>>>,
    loading: Mutex<()>,
}

impl CountryDirectory {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(None),
            loading: Mutex::new(()),
        }
    }

    /// The process-wide directory.
    pub fn global() -> &'static CountryDirectory {
        &GLOBAL
    }

    pub async fn is_loaded(&self) -> bool {
        self.table.read().await.is_some()
    }

    /// Cached table, loading it from `source` on first use.
    ///
    /// Concurrent callers share a single fetch.
    pub async fn get_or_load(
        &self,
        source: &dyn CountrySource,
    ) -> Result<Arc<CountryTable>, CountryError> {
        if let Some(table) = self.table.read().await.as_ref() {
            return Ok(Arc::clone(table));
        }

        let _loading = self.loading.lock().await;
        if let Some(table) = self.table.read().await.as_ref() {
            return Ok(Arc::clone(table));
        }

        let fetched = source.fetch().await?;
        let table: Arc<CountryTable> = Arc::new(
            fetched
                .into_iter()
                .map(|(code, name)| (code.to_ascii_lowercase(), name))
                .collect(),
        );
        debug!("Loaded {} country codes", table.len());
        *self.table.write().await = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Drop the cached table. The next lookup fetches again.
    pub async fn invalidate(&self) {
        let _loading = self.loading.lock().await;
        *self.table.write().await = None;
        debug!("Country table invalidated");
    }

    /// Country name for a two-letter code, case-insensitive.
    pub async fn name_for(
        &self,
        source: &dyn CountrySource,
        code: &str,
    ) -> Result<Option<String>, CountryError> {
        let table = self.get_or_load(source).await?;
        Ok(table.get(&code.trim().to_ascii_lowercase()).cloned())
    }
}

impl Default for CountryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// Flag image URL for `code`, or `None` unless it is two ASCII letters.
pub fn flag_url(config: &CountriesConfig, code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(
        config
            .flag_url_template
            .replace("{code}", &code.to_ascii_lowercase()),
    )
}
