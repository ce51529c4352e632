use async_trait::async_trait;
pub use opserver_common::error::LoadError;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

/// Loads a URL as an image, reporting only whether it worked.
///
/// The probe engine is generic over this so tests can script outcomes and a
/// real deployment can fetch over HTTP.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Fetch `url` and check that an image came back.
    async fn load(&self, url: &str) -> Result<(), LoadError>;
}

/// `ImageLoader` backed by a reqwest client.
pub struct HttpImageLoader {
    client: reqwest::Client,
    origin: Option<Url>,
}

impl HttpImageLoader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            origin: None,
        }
    }

    /// Resolve relative candidates (the same-origin proxy) against `origin`.
    pub fn with_origin(origin: &str) -> Result<Self, LoadError> {
        let origin = Url::parse(origin).map_err(|_| LoadError::Unresolvable(origin.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            origin: Some(origin),
        })
    }

    /// Use a preconfigured client (timeouts, proxy settings, user agent).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn resolve(&self, url: &str) -> Result<Url, LoadError> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .origin
                .as_ref()
                .and_then(|origin| origin.join(url).ok())
                .ok_or_else(|| LoadError::Unresolvable(url.to_string())),
            Err(_) => Err(LoadError::Unresolvable(url.to_string())),
        }
    }
}

impl Default for HttpImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<(), LoadError> {
        let target = self.resolve(url)?;
        debug!("Fetching image {}", target);

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| LoadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }

        // A missing content type is accepted.
        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            && !content_type.starts_with("image/")
        {
            return Err(LoadError::NotAnImage(content_type.to_string()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LoadError::Network(e.to_string()))?;
        if body.is_empty() {
            return Err(LoadError::EmptyBody);
        }

        Ok(())
    }
}
