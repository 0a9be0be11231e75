//! Core transformation engine for the nameid service.
//!
//! The crate is pure CPU over decoded JSON entities: it compiles a request
//! path into a [`Plan`], resolves which entity keys each plan entry targets,
//! and rewrites the targeted identifier values into deterministic RFC 4122
//! version-5 UUIDs. All I/O (HTTP, configuration, the alias backend) lives
//! in the sibling crates.
//!
//! # Pipeline
//!
//! ```text
//! request path ──> Plan::compile ──> Plan
//! request body ──> Vec<Entity> ─┬──> transform_batch ──> Vec<Entity>
//!                               └──  Plan + AliasResolver
//! ```
//!
//! # Example
//!
//! ```
//! use nameid_core::{seed_from_str, transform_batch, LocalDeriver, Plan};
//!
//! let plan = Plan::compile("/shaid").unwrap();
//! let deriver = LocalDeriver::new(seed_from_str("example"));
//! let entities = serde_json::from_str(r#"[{"shaid":"order-17"}]"#).unwrap();
//! let out = transform_batch(entities, &plan, &deriver);
//! assert!(out[0]["shaid"].as_str().unwrap().contains('-'));
//! ```

pub mod derive;
pub mod entity;
pub mod gate;
pub mod plan;
pub mod resolve;
pub mod transform;

pub use derive::{derive, seed_from_str, AliasResolver, LocalDeriver};
pub use entity::Entity;
pub use plan::{FieldSpec, MatchKind, Plan, PlanError, RewriteStyle, TypeGate};
pub use transform::{transform_batch, transform_entity};
