use tracing::debug;

use super::IngestionError;

/// Public observations feed of the Estonian Environment Agency.
pub const DEFAULT_FEED_URL: &str = "https://www.ilmateenistus.ee/ilma_andmed/xml/observations.php";

/// HTTP client for the observations feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    url: String,
}

impl FeedClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Downloads the raw XML document.
    pub async fn fetch(&self) -> Result<String, IngestionError> {
        debug!(url = %self.url, "fetching observation feed");
        let body = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_URL)
    }
}
