//! Service-level error types.

use thiserror::Error;

/// Fatal configuration problems detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither `UUID_SEED`/`--seed` nor `--uuid` provided a usable seed.
    #[error("fatal: missing environment 'UUID_SEED' or option 'seed' or 'uuid' for the namespace seed")]
    MissingSeed,
}

/// Failures on the alias backend path. These never fail a request: the
/// caller logs them and falls back to local derivation.
#[derive(Debug, Error)]
pub enum AliasError {
    /// OAuth2 token acquisition failed.
    #[error("token acquisition failed: {0}")]
    Token(String),

    /// Transport-level failure talking to the alias service.
    #[error("alias service request failed: {0}")]
    Http(String),

    /// The alias service answered with a non-success status.
    #[error("alias service rejected batch ({status}): {body}")]
    Rejected { status: u16, body: String },
}
