//! Operator gate checked before any category is fetched.

use anyhow::{bail, Result};
use proof_config::{sha256_hex, AccessSettings};

/// Enforce `access.operator_token_sha256` against the token in the env var
/// named by `access.token_env`. No configured hash means no gate.
pub fn check_operator_access(access: &AccessSettings) -> Result<()> {
    let token = std::env::var(&access.token_env).ok();
    check_operator_token(
        access.operator_token_sha256.as_deref(),
        &access.token_env,
        token.as_deref(),
    )
}

pub fn check_operator_token(
    expected_sha256: Option<&str>,
    token_env: &str,
    token: Option<&str>,
) -> Result<()> {
    let Some(expected) = expected_sha256 else {
        return Ok(());
    };
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        bail!("ACCESS_DENIED: operator token required (set {token_env})");
    };
    if !sha256_hex(token.as_bytes()).eq_ignore_ascii_case(expected.trim()) {
        bail!("ACCESS_DENIED: operator token does not match");
    }
    Ok(())
}
