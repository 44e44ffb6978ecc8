//! Typed view of the merged config.
//!
//! Every field has a default so an empty config is a complete, valid run
//! configuration. Defaults mirror the listing site the tool was built for.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    pub input: InputSettings,
    pub fetch: FetchSettings,
    pub pacing: PacingSettings,
    pub concurrency: ConcurrencySettings,
    pub report: ReportSettings,
    pub access: AccessSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub category_depth: usize,
    pub columns: ColumnSettings,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            category_depth: 5,
            columns: ColumnSettings::default(),
        }
    }
}

/// Header names of the four required dataset columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSettings {
    pub profile_url: String,
    pub name: String,
    pub sort_date: String,
    pub badge_text: String,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self {
            profile_url: "Company Web Profile URL".to_string(),
            name: "PublishedName".to_string(),
            sort_date: "Oldest Signing Date".to_string(),
            badge_text: "OldestBestPickText".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchBackend {
    Http,
    Browser,
}

impl FetchBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchBackend::Http => "http",
            FetchBackend::Browser => "browser",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(FetchBackend::Http),
            "browser" => Ok(FetchBackend::Browser),
            other => bail!("CONFIG_INVALID fetch.backend='{other}' (expected http|browser)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub backend: FetchBackend,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub extract: ExtractSettings,
    pub browser: BrowserSettings,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            backend: FetchBackend::Http,
            timeout_secs: 10,
            user_agent: concat!("proof/", env!("CARGO_PKG_VERSION")).to_string(),
            extract: ExtractSettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

/// Where listings live in a category page's markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Any element carrying one of these classes is a listing card.
    pub card_classes: Vec<String>,
    /// First element with this tag inside a card holds the name.
    pub name_tag: String,
    /// Tried in order; the first class found inside a card holds the badge.
    pub badge_classes: Vec<String>,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            card_classes: vec!["provider-summary".to_string(), "company-card".to_string()],
            name_tag: "h3".to_string(),
            badge_classes: vec!["years".to_string(), "badge".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            command: "chromium".to_string(),
            args: vec![
                "--headless".to_string(),
                "--disable-gpu".to_string(),
                "--dump-dom".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub enabled: bool,
    pub delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 1_000,
            max_delay_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencySettings {
    pub workers: usize,
}

impl Default for ConcurrencySettings {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportModeSetting {
    All,
    FailingOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub mode: ReportModeSetting,
    pub separator: String,
    pub no_issues_text: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            mode: ReportModeSetting::All,
            separator: "; ".to_string(),
            no_issues_text: "No issues".to_string(),
        }
    }
}

/// Optional operator gate. When `operator_token_sha256` is set, the env var
/// named by `token_env` must hash to it before a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSettings {
    pub operator_token_sha256: Option<String>,
    pub token_env: String,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            operator_token_sha256: None,
            token_env: "PROOF_OPERATOR_TOKEN".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Decode + validate
// ---------------------------------------------------------------------------

impl ProofConfig {
    /// Deserialize from merged config JSON and validate.
    pub fn from_json(v: &Value) -> Result<Self> {
        let cfg: ProofConfig =
            serde_json::from_value(v.clone()).context("CONFIG_INVALID: type mismatch")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.category_depth < 3 {
            bail!(
                "CONFIG_INVALID input.category_depth={} (must be >= 3)",
                self.input.category_depth
            );
        }
        let cols = &self.input.columns;
        for (key, val) in [
            ("profile_url", &cols.profile_url),
            ("name", &cols.name),
            ("sort_date", &cols.sort_date),
            ("badge_text", &cols.badge_text),
        ] {
            if val.trim().is_empty() {
                bail!("CONFIG_INVALID input.columns.{key} is empty");
            }
        }

        if self.fetch.timeout_secs == 0 {
            bail!("CONFIG_INVALID fetch.timeout_secs must be > 0");
        }
        let ex = &self.fetch.extract;
        if ex.card_classes.iter().all(|c| c.trim().is_empty()) {
            bail!("CONFIG_INVALID fetch.extract.card_classes is empty");
        }
        if ex.name_tag.trim().is_empty() {
            bail!("CONFIG_INVALID fetch.extract.name_tag is empty");
        }
        if self.fetch.backend == FetchBackend::Browser && self.fetch.browser.command.trim().is_empty()
        {
            bail!("CONFIG_INVALID fetch.browser.command is empty");
        }

        if self.pacing.delay_ms > self.pacing.max_delay_ms {
            bail!(
                "CONFIG_INVALID pacing.delay_ms={} exceeds pacing.max_delay_ms={}",
                self.pacing.delay_ms,
                self.pacing.max_delay_ms
            );
        }

        if self.concurrency.workers == 0 {
            bail!("CONFIG_INVALID concurrency.workers must be >= 1");
        }

        if let Some(h) = &self.access.operator_token_sha256 {
            if h.len() != 64 || !h.chars().all(|c| c.is_ascii_hexdigit()) {
                bail!("CONFIG_INVALID access.operator_token_sha256 must be 64 hex chars");
            }
            if self.access.token_env.trim().is_empty() {
                bail!("CONFIG_INVALID access.token_env is empty");
            }
        }

        Ok(())
    }
}
