//! Service configuration.
//!
//! Options arrive on the command line; each has an environment variable that
//! overrides it whenever the variable is set and non-empty. The namespace
//! seed is the one mandatory option: it is either derived from an operator
//! string (`UUID_SEED` / `--seed`) or supplied directly as a UUID, and its
//! absence is fatal at startup.

use std::env;
use std::net::SocketAddr;

use clap::Parser;
use nameid_core::seed_from_str;
use uuid::Uuid;

use crate::alias::AliasConfig;
use crate::error::ConfigError;

/// Default alias batch size.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default listen address.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:5000";

/// Command-line options.
///
/// Apply [`Options::with_env`] before resolving: the environment wins over
/// whatever was passed on the command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "nameid-httpd")]
#[command(about = "HTTP microservice rewriting identifier fields into name-based UUIDs")]
pub struct Options {
    /// Operator seed string; hashed into the namespace seed UUID.
    /// Overridden by UUID_SEED.
    #[arg(long)]
    pub seed: Option<String>,

    /// Namespace seed supplied directly as a UUID.
    #[arg(long)]
    pub uuid: Option<Uuid>,

    /// Log level: OFF, QUIET, LIVE, FATAL, ERROR, WARN, INFO, DEBUG, TRACE
    /// or ALL (tracing level names are accepted too). Overridden by LOG_LEVEL.
    #[arg(long, default_value = "ERROR")]
    pub log_level: String,

    /// Alias service endpoint. Overridden by SERVICE_URL.
    #[arg(long)]
    pub service_url: Option<String>,

    /// OAuth2 token endpoint for the alias service. Overridden by TOKEN_URL.
    #[arg(long)]
    pub token_url: Option<String>,

    /// OAuth2 client id. Overridden by CLIENT_ID.
    #[arg(long)]
    pub client_id: Option<String>,

    /// OAuth2 client secret. Overridden by CLIENT_SECRET.
    #[arg(long)]
    pub client_secret: Option<String>,

    /// Comma-separated OAuth2 scopes. Overridden by CLIENT_SCOPES.
    #[arg(long, default_value = "data-identity")]
    pub client_scopes: String,

    /// Initial alias batch size (grows when requests exceed it).
    /// Overridden by BATCH_SIZE.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Listen address. Overridden by NAMEID_LISTEN.
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,
}

/// Resolved, validated process configuration. Read-only after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// The namespace seed all derivations run under.
    pub seed: Uuid,
    /// The operator string the seed was derived from, when one was given.
    pub seed_input: Option<String>,
    /// Log filter directive for the tracing subscriber.
    pub log_filter: &'static str,
    /// Alias backend configuration, when complete.
    pub alias: Option<AliasConfig>,
    /// Alias backend options still missing (each one a startup warning).
    pub missing_alias_options: Vec<&'static str>,
    pub batch_size: usize,
    pub listen: SocketAddr,
}

impl Options {
    /// Overlay the process environment onto the parsed flags.
    ///
    /// A set, non-empty variable replaces the corresponding flag value; the
    /// seed additionally requires non-blank content, and numeric or address
    /// variables that fail to parse leave the flag value in place.
    pub fn with_env(mut self) -> Self {
        if let Some(value) = non_empty_env("UUID_SEED") {
            if !value.trim().is_empty() {
                self.seed = Some(value);
            }
        }
        if let Some(value) = non_empty_env("LOG_LEVEL") {
            self.log_level = value;
        }
        if let Some(value) = non_empty_env("SERVICE_URL") {
            self.service_url = Some(value);
        }
        if let Some(value) = non_empty_env("TOKEN_URL") {
            self.token_url = Some(value);
        }
        if let Some(value) = non_empty_env("CLIENT_ID") {
            self.client_id = Some(value);
        }
        if let Some(value) = non_empty_env("CLIENT_SECRET") {
            self.client_secret = Some(value);
        }
        if let Some(value) = non_empty_env("CLIENT_SCOPES") {
            self.client_scopes = value;
        }
        if let Some(value) = non_empty_env("BATCH_SIZE") {
            if let Ok(size) = value.parse() {
                self.batch_size = size;
            }
        }
        if let Some(value) = non_empty_env("NAMEID_LISTEN") {
            if let Ok(listen) = value.parse() {
                self.listen = listen;
            }
        }
        self
    }

    /// Resolve options into a [`Config`], or fail on a missing seed.
    pub fn resolve(self) -> Result<Config, ConfigError> {
        let (seed, seed_input) = match self.seed.as_deref().map(str::trim) {
            Some(input) if !input.is_empty() => (seed_from_str(input), Some(input.to_string())),
            _ => match self.uuid {
                Some(uuid) if !uuid.is_nil() => (uuid, None),
                _ => return Err(ConfigError::MissingSeed),
            },
        };

        let scopes: Vec<String> = self
            .client_scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let mut missing = Vec::new();
        if none_or_empty(&self.service_url) {
            missing.push("SERVICE_URL");
        }
        if none_or_empty(&self.token_url) {
            missing.push("TOKEN_URL");
        }
        if none_or_empty(&self.client_id) {
            missing.push("CLIENT_ID");
        }
        if none_or_empty(&self.client_secret) {
            missing.push("CLIENT_SECRET");
        }
        if scopes.is_empty() {
            missing.push("CLIENT_SCOPES");
        }

        let alias = if missing.is_empty() {
            Some(AliasConfig {
                service_url: self.service_url.unwrap_or_default(),
                token_url: self.token_url.unwrap_or_default(),
                client_id: self.client_id.unwrap_or_default(),
                client_secret: self.client_secret.unwrap_or_default(),
                scopes,
            })
        } else {
            None
        };

        Ok(Config {
            seed,
            seed_input,
            log_filter: level_filter(&self.log_level),
            alias,
            missing_alias_options: missing,
            batch_size: self.batch_size,
            listen: self.listen,
        })
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.is_empty())
}

fn none_or_empty(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Map the service's level ladder onto a tracing filter directive.
///
/// Unknown levels keep the default of `error` rather than failing startup.
fn level_filter(level: &str) -> &'static str {
    match level.to_ascii_uppercase().as_str() {
        "OFF" => "off",
        "QUIET" | "LIVE" | "FATAL" | "ERROR" => "error",
        "WARN" => "warn",
        "INFO" => "info",
        "DEBUG" => "debug",
        "TRACE" | "ALL" => "trace",
        _ => "error",
    }
}
