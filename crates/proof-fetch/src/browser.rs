use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use proof_schemas::ObservedEntry;
use tokio::process::Command;
use tracing::debug;

use crate::error::FetchError;
use crate::extract::{extract_listings, ExtractRules};
use crate::PageFetcher;

/// Renders the page in a headless browser and reads back the final DOM.
///
/// The browser is invoked as `<command> <args...> <url>` and must print the
/// serialized document on stdout (Chromium's `--dump-dom`). The child is
/// killed if it outlives the timeout.
#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    command: String,
    args: Vec<String>,
    timeout: Duration,
    rules: ExtractRules,
}

impl BrowserFetcher {
    pub fn new(
        command: String,
        args: Vec<String>,
        timeout: Duration,
        rules: ExtractRules,
    ) -> Result<Self, FetchError> {
        if command.trim().is_empty() {
            return Err(FetchError::Config("browser command is empty".to_string()));
        }
        Ok(Self {
            command,
            args,
            timeout,
            rules,
        })
    }

    pub async fn render(&self, url: &str) -> Result<String, FetchError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| FetchError::Browser(format!("failed to launch '{}': {e}", self.command)))?;

        // Dropping the pending wait on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(res) => res.map_err(|e| FetchError::Browser(format!("browser i/o failed: {e}")))?,
            Err(_) => {
                return Err(FetchError::Timeout {
                    secs: self.timeout.as_secs(),
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let first = stderr.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(FetchError::Browser(format!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                first.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    fn backend_name(&self) -> &'static str {
        "browser"
    }

    async fn fetch(&self, url: &str) -> Result<Vec<ObservedEntry>, FetchError> {
        let dom = self.render(url).await?;
        let listings = extract_listings(&dom, &self.rules);
        debug!(url, bytes = dom.len(), listings = listings.len(), "rendered category page");
        Ok(listings)
    }
}
