use super::{looks_like_image, ResourceLoader};
use crate::error::LoadError;
use crate::model::ExtensionUrl;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};

/// Maps extension URLs onto an HTTP origin as `<base>/<id>/<path>`.
///
/// Useful against a browser-side bridge or a mirror of unpacked extensions.
/// Existence checks only care whether the request completes; the response
/// status is never inspected.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLoader {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an `http(s)://` URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, LoadError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Result<Self, LoadError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(LoadError::InvalidUrl(base_url));
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn resolve(&self, url: &ExtensionUrl) -> String {
        format!("{}/{}/{}", self.base_url, url.id, url.path)
    }
}

#[async_trait]
impl ResourceLoader for HttpLoader {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn load_image(&self, url: &ExtensionUrl) -> Result<(), LoadError> {
        let response = self
            .client
            .get(self.resolve(url))
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LoadError::Status(response.status().as_u16()));
        }

        let declared_image = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(false);

        let bytes = response.bytes().await?;
        if declared_image || looks_like_image(&bytes) {
            Ok(())
        } else {
            Err(LoadError::NotAnImage(url.to_string()))
        }
    }

    async fn check_exists(&self, url: &ExtensionUrl) -> Result<(), LoadError> {
        self.client
            .head(self.resolve(url))
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;
        Ok(())
    }
}
