//! Application service: the provisioning writer.
//!
//! Selects the stack, guards it with the project fingerprint, and applies a
//! write plan through the `StackStore` port. Writes are strictly sequential.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{
    HookRunner, LocalFs, ProgressReporter, StackSelection, StackStore,
};
use crate::application::services::fleet_plan::FleetPlan;
use crate::application::services::secret_resolution::{
    Resolution, ResolutionInput, resolve_values, write_env_example,
};
use crate::domain::error::StackError;
use crate::domain::provision::{StoreWrite, WriteReport, plan_writes};
use crate::domain::registry::Registries;
use crate::domain::resolution::SecretSource;
use crate::domain::stack::FINGERPRINT_KEY;

/// What a provisioning run works from.
#[derive(Debug, Clone, Copy)]
pub struct ProvisionRequest<'a> {
    pub project_root: &'a Path,
    pub plan: &'a FleetPlan,
    pub source: &'a SecretSource,
    pub ambient: &'a BTreeMap<String, String>,
    pub fingerprint: &'a str,
}

/// Result of a completed provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub selection: StackSelection,
    pub resolution: Resolution,
    pub report: WriteReport,
}

/// Full provisioning run: regenerate `.env.example`, open and verify the
/// stack, resolve every value against what the stack already holds, then
/// write.
///
/// # Errors
///
/// `StackError::Collision` before anything is written, any resolution
/// error, or the first failing store call.
pub async fn provision_fleet(
    store: &impl StackStore,
    hooks: &impl HookRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    registries: &Registries,
    request: ProvisionRequest<'_>,
) -> Result<ProvisionOutcome> {
    let plan = request.plan;
    let stack = plan.fleet.stack_name.as_str();

    write_env_example(fs, request.project_root, &plan.schema)?;

    reporter.step(&format!("opening stack '{stack}'..."));
    let selection = open_stack(store, reporter, stack, request.fingerprint).await?;

    let managed = &plan.schema.managed_global_keys;
    let previous = read_previous_globals(store, managed).await?;
    tracing::debug!(previous = previous.len(), "read managed global values");

    let resolution = resolve_values(
        hooks,
        reporter,
        registries,
        ResolutionInput {
            fleet: &plan.fleet,
            schema: &plan.schema,
            source: request.source,
            ambient: request.ambient,
            previous: &previous,
        },
    )
    .await?;

    let writes = plan_writes(
        &plan.fleet,
        &plan.schema,
        &resolution.resolved,
        registries.default_model_provider(),
    );
    reporter.step(&format!("writing {} key(s) to stack '{stack}'...", writes.len()));
    let report = apply_writes(store, reporter, &writes, &resolution.pruned, managed).await?;
    tracing::info!(
        written = report.written.len(),
        removed = report.removed.len(),
        unchanged = report.unchanged.len(),
        "provisioning complete"
    );

    Ok(ProvisionOutcome {
        selection,
        resolution,
        report,
    })
}

/// Selects or creates `stack` and checks it belongs to this project.
///
/// A new stack is stamped with `fingerprint`; an existing stack without one
/// is trusted and backfilled.
///
/// # Errors
///
/// `StackError::Collision` when the stack carries another project's
/// fingerprint. Nothing is written in that case.
pub async fn open_stack(
    store: &impl StackStore,
    reporter: &impl ProgressReporter,
    stack: &str,
    fingerprint: &str,
) -> Result<StackSelection> {
    let selection = store
        .select_or_create(stack)
        .await
        .with_context(|| format!("selecting stack '{stack}'"))?;

    match selection {
        StackSelection::Created => {
            store.set(FINGERPRINT_KEY, fingerprint, false).await?;
            reporter.success(&format!("created stack '{stack}'"));
        }
        StackSelection::Existing => match store.get(FINGERPRINT_KEY).await? {
            Some(found) if found == fingerprint => {
                tracing::debug!(stack, "stack fingerprint verified");
            }
            Some(found) => {
                return Err(StackError::Collision {
                    stack: stack.to_string(),
                    expected: fingerprint.to_string(),
                    found,
                }
                .into());
            }
            None => {
                store.set(FINGERPRINT_KEY, fingerprint, false).await?;
                reporter.warn(&format!(
                    "stack '{stack}' had no project fingerprint; stamped it with {fingerprint}"
                ));
            }
        },
    }
    Ok(selection)
}

/// Reads every managed global value currently in the stack.
///
/// `managed` maps env var → store key; the result is keyed by env var.
///
/// # Errors
///
/// Returns an error if any read fails.
pub async fn read_previous_globals(
    store: &impl StackStore,
    managed: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    let mut previous = BTreeMap::new();
    for (env_var, store_key) in managed {
        if let Some(value) = store.get(store_key).await? {
            previous.insert(env_var.clone(), value);
        }
    }
    Ok(previous)
}

/// Removes pruned keys, then applies `writes` in order, skipping values that
/// are already current.
///
/// # Errors
///
/// Returns the first store error; keys before it stay written.
pub async fn apply_writes(
    store: &impl StackStore,
    reporter: &impl ProgressReporter,
    writes: &[StoreWrite],
    pruned: &BTreeSet<String>,
    managed: &BTreeMap<String, String>,
) -> Result<WriteReport> {
    let mut report = WriteReport::default();

    for env_var in pruned {
        let Some(store_key) = managed.get(env_var) else {
            continue;
        };
        store
            .remove(store_key)
            .await
            .with_context(|| format!("removing {store_key}"))?;
        report.removed.push(store_key.clone());
    }

    for write in writes {
        let current = store.get(&write.key).await?;
        if current.as_deref() == Some(write.value.as_str()) {
            report.unchanged.push(write.key.clone());
            continue;
        }
        store
            .set(&write.key, &write.value, write.secret)
            .await
            .with_context(|| format!("writing {}", write.key))?;
        report.written.push(write.key.clone());
    }

    if report.is_noop() {
        reporter.success("stack already up to date");
    } else {
        reporter.success(&format!(
            "wrote {} key(s), removed {}, {} unchanged",
            report.written.len(),
            report.removed.len(),
            report.unchanged.len()
        ));
    }
    Ok(report)
}
