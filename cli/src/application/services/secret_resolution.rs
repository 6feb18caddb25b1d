//! Application service: the secret resolution pipeline.
//!
//! Drives the pure stages in `domain::resolution` and runs the effectful
//! auto-resolve stage through the `HookRunner` port.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use armada_common::FleetManifest;

use crate::application::ports::{HookOutcome, HookRunner, LocalFs, ProgressReporter};
use crate::domain::env_file::{ENV_EXAMPLE_FILE, render_env_example};
use crate::domain::error::SecretError;
use crate::domain::registry::{Integration, Registries};
use crate::domain::resolution::{
    ResolvedSecrets, SecretSource, ValidationWarning, diff, ensure_complete, lookup, merge,
    partition_auto_resolvable, prune, validate,
};
use crate::domain::schema::{SecretRequirement, SecretSchema};

/// Inputs the pipeline reads but never modifies.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionInput<'a> {
    pub fleet: &'a FleetManifest,
    pub schema: &'a SecretSchema,
    /// Values from `.env`.
    pub source: &'a SecretSource,
    /// Process environment, consulted for role-prefixed overrides of
    /// auto-resolvable values.
    pub ambient: &'a BTreeMap<String, String>,
    /// Global values a previous run persisted, keyed by env var.
    pub previous: &'a BTreeMap<String, String>,
}

/// A complete set of values, ready for the writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub resolved: ResolvedSecrets,
    /// Managed env vars a previous run wrote that nothing requires now.
    pub pruned: BTreeSet<String>,
    pub warnings: Vec<ValidationWarning>,
    /// Values filled in without the operator supplying them.
    pub auto_resolved: Vec<String>,
}

/// Writes `.env.example` for `schema` in `project_root`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_env_example(
    fs: &impl LocalFs,
    project_root: &Path,
    schema: &SecretSchema,
) -> Result<()> {
    let path = project_root.join(ENV_EXAMPLE_FILE);
    fs.write(&path, &render_env_example(schema))
        .with_context(|| format!("writing {}", path.display()))
}

/// Runs the whole pipeline.
///
/// `.env.example` is regenerated before anything can fail.
///
/// # Errors
///
/// `SecretError::HookResolutionFailure` when a hook fails, or
/// `SecretError::MissingSecrets` listing every value still missing.
pub async fn resolve_secrets(
    hooks: &impl HookRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    registries: &Registries,
    project_root: &Path,
    input: ResolutionInput<'_>,
) -> Result<Resolution> {
    write_env_example(fs, project_root, input.schema)?;
    resolve_values(hooks, reporter, registries, input).await
}

/// The pipeline without regenerating `.env.example`.
///
/// # Errors
///
/// Same as [`resolve_secrets`].
pub async fn resolve_values(
    hooks: &impl HookRunner,
    reporter: &impl ProgressReporter,
    registries: &Registries,
    input: ResolutionInput<'_>,
) -> Result<Resolution> {
    let schema = input.schema;
    let pruned = prune(input.previous, schema);
    for env_var in &pruned.removed {
        tracing::info!(env_var, "pruning value no longer required");
    }

    let mut resolved = merge(&pruned.baseline, schema, input.source);
    let missing = diff(schema, &resolved);

    let mut warnings = validate(schema, &resolved);
    for warning in &warnings {
        tracing::debug!(key = %warning.source_key, "{}", warning.message);
        reporter.warn(&warning.to_string());
    }

    let (deferred, blocking) = partition_auto_resolvable(missing);
    tracing::debug!(
        deferred = deferred.len(),
        blocking = blocking.len(),
        "missing values after merge"
    );

    let mut auto_resolved = Vec::new();
    let mut needs_hook = Vec::new();
    for req in deferred {
        match resolve_from_config(&input, req) {
            Some(value) => {
                resolved.set(req, value);
                auto_resolved.push(req.source_key.clone());
            }
            None => needs_hook.push(req),
        }
    }

    // No hook runs while a blocking value is missing.
    if !blocking.is_empty() {
        tracing::debug!(skipped = needs_hook.len(), "blocking values missing, hooks not run");
        ensure_complete(schema, &resolved)?;
    }

    let mut hook_results: BTreeMap<(String, String), BTreeMap<String, String>> = BTreeMap::new();
    for req in needs_hook {
        let value =
            resolve_by_hook(hooks, reporter, registries, &resolved, &mut hook_results, req).await?;
        if let Some(value) = value {
            resolved.set(req, value);
            auto_resolved.push(req.source_key.clone());
        }
    }

    for warning in validate(schema, &resolved) {
        if auto_resolved.contains(&warning.source_key) {
            reporter.warn(&warning.to_string());
            warnings.push(warning);
        }
    }

    ensure_complete(schema, &resolved)?;

    Ok(Resolution {
        resolved,
        pruned: pruned.removed,
        warnings,
        auto_resolved,
    })
}

/// Plugin config first, then the role-prefixed environment.
fn resolve_from_config(input: &ResolutionInput<'_>, req: &SecretRequirement) -> Option<String> {
    if let (Some(role), Some(plugin)) = (req.agent(), req.plugin()) {
        let configured = input
            .fleet
            .agents
            .iter()
            .find(|a| a.role == role)
            .and_then(|a| a.plugin_setting(plugin, &req.key))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if configured.is_some() {
            tracing::debug!(key = %req.source_key, "resolved from plugin config");
            return configured;
        }
    }

    let value = lookup(input.ambient, &req.source_key)?;
    tracing::debug!(key = %req.source_key, "resolved from environment");
    Some(value.to_string())
}

/// Runs the plugin's hook once per agent and plugin and picks `req` out of
/// its output.
async fn resolve_by_hook(
    hooks: &impl HookRunner,
    reporter: &impl ProgressReporter,
    registries: &Registries,
    resolved: &ResolvedSecrets,
    hook_results: &mut BTreeMap<(String, String), BTreeMap<String, String>>,
    req: &SecretRequirement,
) -> Result<Option<String>> {
    let (Some(role), Some(plugin)) = (req.agent(), req.plugin()) else {
        return Ok(None);
    };
    let Integration::Known(entry) = registries.plugin(plugin) else {
        return Ok(None);
    };
    let Some(hook) = &entry.resolve_hook else {
        return Ok(None);
    };

    let cache_key = (role.to_string(), plugin.to_string());
    if !hook_results.contains_key(&cache_key) {
        reporter.step(&format!("resolving {plugin} values for agent {role}..."));
        let env = resolved.agent_env(role);
        let outcome = hooks
            .run_hook(&hook.script, &env)
            .await
            .unwrap_or_else(|e| HookOutcome::Failed {
                reason: format!("{e:#}"),
            });
        match outcome {
            HookOutcome::Resolved(values) => {
                hook_results.insert(cache_key.clone(), values);
            }
            HookOutcome::Failed { reason } => {
                return Err(SecretError::HookResolutionFailure {
                    plugin: plugin.to_string(),
                    agent: role.to_string(),
                    reason,
                    override_var: req.source_key.clone(),
                }
                .into());
            }
        }
    }

    let value = hook_results
        .get(&cache_key)
        .and_then(|values| lookup(values, &req.env_var))
        .map(str::to_string);
    if value.is_some() {
        reporter.success(&format!("{} resolved by {plugin} hook", req.source_key));
    }
    Ok(value)
}
