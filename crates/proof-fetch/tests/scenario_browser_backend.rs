//! Browser backend process handling
//!
//! Stand-in commands play the browser: `cat` prints a saved page, `sleep`
//! hangs, `false` exits non-zero.
//!
//! # Invariants under test
//!
//! 1. Stdout of the browser command is extracted like an HTTP body.
//! 2. A browser that outlives the timeout yields `Timeout`.
//! 3. A non-zero exit or a missing binary yields `Browser`.

#![cfg(unix)]

use std::io::Write;
use std::time::Duration;

use proof_fetch::{BrowserFetcher, ExtractRules, FetchError, PageFetcher};

fn browser(command: &str, timeout_secs: u64) -> BrowserFetcher {
    BrowserFetcher::new(
        command.to_string(),
        Vec::new(),
        Duration::from_secs(timeout_secs),
        ExtractRules::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn dumped_dom_is_extracted() {
    let mut page = tempfile::NamedTempFile::new().unwrap();
    write!(
        page,
        r#"<div class="company-card"><h3>Rendered Co</h3><span class="years">4 Years</span></div>"#
    )
    .unwrap();
    page.flush().unwrap();

    let got = browser("cat", 5)
        .fetch(page.path().to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].raw_name, "Rendered Co");
    assert_eq!(got[0].raw_badge_text, "4 Years");
}

#[tokio::test]
async fn hung_browser_times_out() {
    let started = std::time::Instant::now();
    let err = browser("sleep", 1).fetch("30").await.unwrap_err();
    assert_eq!(err, FetchError::Timeout { secs: 1 });
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn nonzero_exit_is_browser_error() {
    let err = browser("false", 5)
        .fetch("https://www.example.com/a/b")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Browser(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_binary_is_browser_error() {
    let err = browser("definitely-not-a-browser-7f3a", 5)
        .fetch("https://www.example.com/a/b")
        .await
        .unwrap_err();
    match err {
        FetchError::Browser(msg) => assert!(msg.contains("failed to launch")),
        other => panic!("unexpected {other:?}"),
    }
}
