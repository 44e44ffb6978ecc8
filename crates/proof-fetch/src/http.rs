use std::time::Duration;

use async_trait::async_trait;
use proof_schemas::ObservedEntry;
use tracing::debug;

use crate::error::FetchError;
use crate::extract::{extract_listings, ExtractRules};
use crate::PageFetcher;

/// Plain HTTP GET of the category page. Sees only server-rendered markup.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    timeout: Duration,
    rules: ExtractRules,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration, rules: ExtractRules) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            timeout,
            rules,
        })
    }

    pub async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.text().await.map_err(|e| self.map_reqwest(e))
    }

    fn map_reqwest(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<Vec<ObservedEntry>, FetchError> {
        let html = self.fetch_html(url).await?;
        let listings = extract_listings(&html, &self.rules);
        debug!(url, bytes = html.len(), listings = listings.len(), "fetched category page");
        Ok(listings)
    }
}
