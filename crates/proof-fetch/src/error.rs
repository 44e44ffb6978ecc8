use std::fmt;

use proof_schemas::FetchFailure;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Everything that can go wrong turning a category URL into listings.
///
/// A page that loads but contains no cards is not an error; it yields an
/// empty listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS, TLS or body-read failure.
    Transport(String),
    /// No response within the configured timeout.
    Timeout { secs: u64 },
    /// The server answered with a non-success status.
    HttpStatus { status: u16, url: String },
    /// The headless browser could not be launched or exited abnormally.
    Browser(String),
    /// The backend could not be constructed from configuration.
    Config(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport error: {msg}"),
            FetchError::Timeout { secs } => write!(f, "timed out after {secs}s"),
            FetchError::HttpStatus { status, url } => write!(f, "HTTP {status} for {url}"),
            FetchError::Browser(msg) => write!(f, "browser error: {msg}"),
            FetchError::Config(msg) => write!(f, "fetch config error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<FetchError> for FetchFailure {
    fn from(e: FetchError) -> Self {
        FetchFailure::new(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        assert_eq!(FetchError::Timeout { secs: 10 }.to_string(), "timed out after 10s");
        assert_eq!(
            FetchError::HttpStatus {
                status: 404,
                url: "https://e.com/a/b".to_string()
            }
            .to_string(),
            "HTTP 404 for https://e.com/a/b"
        );
    }

    #[test]
    fn converts_into_failure_with_same_message() {
        let f: FetchFailure = FetchError::Transport("connection refused".to_string()).into();
        assert_eq!(f.message, "transport error: connection refused");
    }
}
