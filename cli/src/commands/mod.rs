//! Command implementations

pub mod config;
pub mod fingerprint;
pub mod provision;
pub mod schema;
pub mod validate;
pub mod version;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::fleet_plan::{FleetPlan, plan_fleet};
use crate::domain::config::ArmadaConfig;
use crate::infra::config::identity_cache_dir;

/// A project with its identities fetched and its schema built.
pub struct LoadedProject {
    pub root: PathBuf,
    pub config: ArmadaConfig,
    pub plan: FleetPlan,
}

/// Resolves the project root, loads user config and plans the fleet.
///
/// # Errors
///
/// Returns an error if the project, config, any identity or the schema
/// cannot be loaded.
pub async fn load_project(app: &AppContext) -> Result<LoadedProject> {
    let root = app.project_root()?;
    let config = config_service::load_config(&app.config_store)?;
    let cache_root = identity_cache_dir(&config)?;
    tracing::debug!(project = %root.display(), cache = %cache_root.display(), "loading project");

    let plan = plan_fleet(
        &app.git(),
        &app.fs,
        &app.reporter(),
        &app.registries,
        &root,
        &cache_root,
    )
    .await?;
    Ok(LoadedProject { root, config, plan })
}

/// The process environment, for role-prefixed overrides.
#[must_use]
pub fn ambient_env() -> BTreeMap<String, String> {
    std::env::vars().collect()
}
