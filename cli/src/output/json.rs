//! JSON output helpers.
//!
//! `JsonRenderer` prints one pretty-printed document per command on stdout.
//! Secret values are never included; only key names.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::application::services::provisioning::ProvisionOutcome;
use crate::application::services::secret_resolution::Resolution;
use crate::domain::config::ArmadaConfig;
use crate::domain::error::{
    ConfigError, FleetError, IdentityError, SchemaError, SecretError, StackError,
};
use crate::domain::schema::SecretSchema;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable code for an error, by its typed cause.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<SecretError>() {
        return match e {
            SecretError::MissingSecrets(_) => "missing_secrets",
            SecretError::HookResolutionFailure { .. } => "hook_failed",
        };
    }
    if err.downcast_ref::<StackError>().is_some() {
        return "stack_collision";
    }
    if let Some(e) = err.downcast_ref::<SchemaError>() {
        return match e {
            SchemaError::Conflict(_) => "schema_conflict",
            SchemaError::MissingTemplateVars(_) => "missing_template_vars",
        };
    }
    if let Some(e) = err.downcast_ref::<IdentityError>() {
        return match e {
            IdentityError::NotFound(_) => "identity_not_found",
            IdentityError::ManifestParse { .. } => "manifest_parse",
            IdentityError::ManifestValidation { .. } => "manifest_invalid",
            IdentityError::Fetch { .. } => "fetch_failed",
        };
    }
    if err.downcast_ref::<FleetError>().is_some() {
        return "fleet_invalid";
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return "config_invalid";
    }
    "error"
}

fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

/// Renders command results as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Render the secret schema.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_schema(stack: &str, schema: &SecretSchema) -> Result<()> {
        print(&json!({
            "stack": stack,
            "schema": schema,
        }))
    }

    /// Render a successful resolution: which keys are set, never their values.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_validation(schema: &SecretSchema, resolution: &Resolution) -> Result<()> {
        print(&resolution_json(schema, resolution))
    }

    /// Render a completed provisioning run.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_provision(
        stack: &str,
        schema: &SecretSchema,
        outcome: &ProvisionOutcome,
    ) -> Result<()> {
        print(&json!({
            "stack": stack,
            "created": outcome.selection == crate::application::ports::StackSelection::Created,
            "resolution": resolution_json(schema, &outcome.resolution),
            "writes": outcome.report,
        }))
    }

    /// Render the project fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_fingerprint(project_root: &Path, fingerprint: &str) -> Result<()> {
        print(&json!({
            "project": project_root.display().to_string(),
            "fingerprint": fingerprint,
        }))
    }

    /// Render the user configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_config(config: &ArmadaConfig, path: &Path) -> Result<()> {
        print(&json!({
            "path": path.display().to_string(),
            "config": config,
        }))
    }

    /// Render a configuration value that was just set.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_config_set(key: &str, value: &str) -> Result<()> {
        print(&json!({ "key": key, "value": value }))
    }

    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_version(version: &str) -> Result<()> {
        print(&json!({ "version": version }))
    }
}

fn resolution_json(schema: &SecretSchema, resolution: &Resolution) -> serde_json::Value {
    let resolved: Vec<&str> = schema
        .all()
        .filter(|req| resolution.resolved.get(req).is_some())
        .map(|req| req.source_key.as_str())
        .collect();
    json!({
        "resolved": resolved,
        "autoResolved": resolution.auto_resolved,
        "pruned": resolution.pruned,
        "warnings": resolution.warnings,
    })
}
