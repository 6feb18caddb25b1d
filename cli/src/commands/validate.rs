//! `armada validate`: resolve every value without touching the stack.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::fleet_plan::load_secret_source;
use crate::application::services::secret_resolution::{ResolutionInput, resolve_secrets};
use crate::commands::{ambient_env, load_project};

/// Run the validate command.
///
/// Nothing persisted is known offline, so pruning never removes anything.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let project = load_project(app).await?;
    let source = load_secret_source(&app.fs, &project.root)?;
    let ambient = ambient_env();
    let previous = BTreeMap::new();

    let resolution = resolve_secrets(
        &app.hooks(&project.config),
        &app.fs,
        &app.reporter(),
        &app.registries,
        &project.root,
        ResolutionInput {
            fleet: &project.plan.fleet,
            schema: &project.plan.schema,
            source: &source,
            ambient: &ambient,
            previous: &previous,
        },
    )
    .await?;

    app.renderer()
        .render_validation(&project.plan.schema, &resolution)?;
    Ok(ExitCode::SUCCESS)
}
