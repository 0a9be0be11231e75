//! Service plumbing for the nameid microservice: configuration, the alias
//! backend boundary, and request batching.
//!
//! Nothing here touches the transformation semantics — those live in
//! `nameid-core`. This crate owns everything with an environment: option
//! parsing, log-level mapping, the OAuth2 token cache, and the accumulator
//! that will feed the alias backend once batch dispatch is wired up.

pub mod alias;
pub mod batch;
pub mod config;
pub mod error;

pub use alias::{AliasClient, AliasConfig, AliasEntry, AliasRequest, AliasResponse};
pub use batch::{Batch, BatchSize};
pub use config::{Config, Options, DEFAULT_BATCH_SIZE, DEFAULT_LISTEN};
pub use error::{AliasError, ConfigError};
