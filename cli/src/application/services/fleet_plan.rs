//! Application service: load a project and build its secret schema.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;

use anyhow::Result;
use armada_common::FleetManifest;

use crate::application::ports::{GitClient, LocalFs, ProgressReporter};
use crate::application::services::identity_fetch::{FetchedIdentity, fetch_fleet_identities};
use crate::domain::env_file::{ENV_FILE, parse_env};
use crate::domain::error::FleetError;
use crate::domain::fleet::{FLEET_MANIFEST_FILE, check_template_vars, parse_fleet};
use crate::domain::registry::Registries;
use crate::domain::resolution::SecretSource;
use crate::domain::schema::{AgentBinding, SecretSchema, build_schema};

/// Everything known about a fleet before secrets are resolved.
#[derive(Debug, Clone)]
pub struct FleetPlan {
    pub fleet: FleetManifest,
    /// One per agent, in fleet order.
    pub identities: Vec<FetchedIdentity>,
    pub schema: SecretSchema,
}

/// Reads and validates `armada.yaml` in `project_root`.
///
/// # Errors
///
/// `FleetError::NotFound`, `Parse` or `Invalid`.
pub fn load_fleet(fs: &impl LocalFs, project_root: &Path) -> Result<FleetManifest> {
    let path = project_root.join(FLEET_MANIFEST_FILE);
    if !fs.exists(&path) {
        return Err(FleetError::NotFound(project_root.display().to_string()).into());
    }
    let content = fs.read_to_string(&path)?;
    Ok(parse_fleet(&content, &path.display().to_string())?)
}

/// Reads `.env` in `project_root`; a missing file is an empty source.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_secret_source(fs: &impl LocalFs, project_root: &Path) -> Result<SecretSource> {
    let path = project_root.join(ENV_FILE);
    if !fs.exists(&path) {
        return Ok(SecretSource::new());
    }
    Ok(parse_env(&fs.read_to_string(&path)?))
}

/// Loads the fleet, fetches every identity and builds the schema.
///
/// Registry warnings are reported and kept on the schema.
///
/// # Errors
///
/// Any fleet, identity, template-variable or schema error.
pub async fn plan_fleet(
    git: &impl GitClient,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    registries: &Registries,
    project_root: &Path,
    cache_root: &Path,
) -> Result<FleetPlan> {
    let fleet = load_fleet(fs, project_root)?;

    reporter.step(&format!("fetching {} identities...", fleet.agents.len()));
    let identities =
        fetch_fleet_identities(git, fs, &fleet.agents, project_root, cache_root).await?;
    reporter.success("identities resolved");

    check_template_vars(
        &fleet.template_vars,
        fleet
            .agents
            .iter()
            .zip(&identities)
            .map(|(agent, id)| (agent.role.as_str(), &id.manifest)),
    )?;

    let bindings: Vec<AgentBinding<'_>> = fleet
        .agents
        .iter()
        .zip(&identities)
        .map(|(agent, id)| AgentBinding {
            agent,
            identity: &id.manifest,
        })
        .collect();
    let schema = build_schema(fleet.provider, &bindings, registries)?;
    for warning in &schema.warnings {
        tracing::debug!(%warning, "schema warning");
        reporter.warn(warning);
    }
    tracing::info!(
        global = schema.global.len(),
        agents = schema.agents.len(),
        "secret schema built"
    );

    Ok(FleetPlan {
        fleet,
        identities,
        schema,
    })
}
