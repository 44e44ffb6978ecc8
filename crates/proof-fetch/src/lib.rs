//! proof-fetch
//!
//! Turns a category URL into the listing the page renders, in order.
//!
//! Two backends implement [`PageFetcher`]: [`HttpFetcher`] downloads the raw
//! markup, [`BrowserFetcher`] lets a headless browser render client-side
//! content first. Both hand the markup to [`extract_listings`]. Which one a
//! run uses is a config decision ([`fetcher_from_settings`]); the engine never
//! branches on it.

mod browser;
mod error;
mod extract;
mod http;

pub use browser::BrowserFetcher;
pub use error::FetchError;
pub use extract::{extract_listings, ExtractRules, MAX_DEPTH};
pub use http::HttpFetcher;

use std::sync::Arc;
use std::time::Duration;

use proof_config::{FetchBackend, FetchSettings};
use proof_schemas::{Observed, ObservedEntry};

/// Pluggable page source.
///
/// Implementations must not panic and must not retry; every failure comes
/// back as a [`FetchError`].
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn fetch(&self, url: &str) -> Result<Vec<ObservedEntry>, FetchError>;

    /// [`PageFetcher::fetch`] folded into what the reconciliation engine takes.
    async fn observe(&self, url: &str) -> Observed {
        self.fetch(url).await.map_err(Into::into)
    }
}

/// Build the backend named by `fetch.backend`.
pub fn fetcher_from_settings(s: &FetchSettings) -> Result<Arc<dyn PageFetcher>, FetchError> {
    let rules = ExtractRules::from(&s.extract);
    let timeout = Duration::from_secs(s.timeout_secs);
    match s.backend {
        FetchBackend::Http => Ok(Arc::new(HttpFetcher::new(&s.user_agent, timeout, rules)?)),
        FetchBackend::Browser => Ok(Arc::new(BrowserFetcher::new(
            s.browser.command.clone(),
            s.browser.args.clone(),
            timeout,
            rules,
        )?)),
    }
}
