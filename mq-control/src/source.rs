use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("allow-list fetch failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where the consumer allow-list document lives.
#[async_trait]
pub trait AllowListSource: Send + Sync + 'static {
    /// Fetches the current document. An empty string means "not
    /// configured".
    async fn fetch(&self) -> Result<String, SourceError>;
}

/// Allow-list stored as a plain-text document behind an HTTP endpoint.
pub struct HttpAllowListSource {
    client: reqwest::Client,
    url: String,
}

impl HttpAllowListSource {
    pub fn new(url: String) -> Self {
        HttpAllowListSource {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl AllowListSource for HttpAllowListSource {
    async fn fetch(&self) -> Result<String, SourceError> {
        let response = self.client.get(&self.url).send().await?;

        // A missing document is "not configured", not a failure.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(String::new());
        }

        let body = response.error_for_status()?.text().await?;
        Ok(body)
    }
}

/// Fixed in-memory allow-list for tests.
pub struct StaticAllowList {
    value: RwLock<String>,
}

impl StaticAllowList {
    pub fn new(value: &str) -> Self {
        StaticAllowList {
            value: RwLock::new(value.to_string()),
        }
    }

    pub fn set(&self, value: &str) {
        *self.value.write() = value.to_string();
    }
}

#[async_trait]
impl AllowListSource for StaticAllowList {
    async fn fetch(&self) -> Result<String, SourceError> {
        Ok(self.value.read().clone())
    }
}
