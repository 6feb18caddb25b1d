//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

use crate::domain::resolution::MissingSecret;

/// Renders a batch of problems as an indented bullet list.
fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  - {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn missing_list(items: &[MissingSecret]) -> String {
    items
        .iter()
        .map(MissingSecret::describe)
        .map(|line| format!("  - {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Identity errors ───────────────────────────────────────────────────────────

/// Errors raised while resolving an identity reference.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity not found: {0}")]
    NotFound(String),

    #[error("Cannot parse identity manifest {path}: {message}")]
    ManifestParse { path: String, message: String },

    #[error("Identity manifest {path} is invalid:\n{}", bullets(.problems))]
    ManifestValidation { path: String, problems: Vec<String> },

    #[error(
        "Failed to fetch identity {url}\n  update: {}\n  clone: {clone}",
        .update.as_deref().unwrap_or("no cached copy")
    )]
    Fetch {
        url: String,
        update: Option<String>,
        clone: String,
    },
}

// ── Fleet manifest errors ─────────────────────────────────────────────────────

/// Errors in the operator-authored fleet manifest.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("No armada.yaml found in {0}. Create one or pass --project <dir>.")]
    NotFound(String),

    #[error("Cannot parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Fleet manifest is invalid:\n{}", bullets(.0))]
    Invalid(Vec<String>),
}

// ── Schema errors ─────────────────────────────────────────────────────────────

/// Errors raised while building the secret schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(
        "Conflicting secret declarations (namespace these keys per plugin):\n{}",
        bullets(.0)
    )]
    Conflict(Vec<String>),

    #[error(
        "Template variables referenced by identities are not set in armada.yaml `templateVars`:\n{}",
        bullets(.0)
    )]
    MissingTemplateVars(Vec<String>),
}

// ── Secret errors ─────────────────────────────────────────────────────────────

/// Errors raised by the secret resolution pipeline.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error(
        "{} required secret(s) missing. Add them to .env (see .env.example):\n{}",
        .0.len(),
        missing_list(.0)
    )]
    MissingSecrets(Vec<MissingSecret>),

    #[error(
        "Resolution hook for plugin '{plugin}' failed for agent '{agent}': {reason}\n\
To skip the hook, set {override_var} in your environment or .env and re-run."
    )]
    HookResolutionFailure {
        plugin: String,
        agent: String,
        reason: String,
        override_var: String,
    },
}

// ── Stack errors ──────────────────────────────────────────────────────────────

/// Errors raised by the provisioning writer.
#[derive(Debug, Error)]
pub enum StackError {
    #[error(
        "Stack '{stack}' belongs to another project (stack fingerprint {found}, this project {expected}).\n\
Rename `stackName` in armada.yaml to a name no other project uses and re-run."
    )]
    Collision {
        stack: String,
        expected: String,
        found: String,
    },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
