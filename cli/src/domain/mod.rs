//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod env_file;
pub mod error;
pub mod fleet;
pub mod identity;
pub mod provision;
pub mod registry;
pub mod resolution;
pub mod schema;
pub mod stack;

pub use config::{ArmadaConfig, validate_config_key, validate_config_value};
pub use error::{ConfigError, FleetError, IdentityError, SchemaError, SecretError, StackError};
pub use registry::Registries;
pub use schema::{SecretRequirement, SecretSchema, build_schema};
