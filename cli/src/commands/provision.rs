//! `armada provision`: resolve every value and write it to the stack.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::fleet_plan::load_secret_source;
use crate::application::services::provisioning::{ProvisionRequest, provision_fleet};
use crate::commands::{ambient_env, load_project};
use crate::domain::stack::stack_fingerprint;

/// Run the provision command.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let project = load_project(app).await?;
    let plan = &project.plan;
    let stack = plan.fleet.stack_name.as_str();

    let prompt = format!(
        "Provision stack '{stack}' ({}, {} agent(s))?",
        plan.fleet.provider.as_str(),
        plan.fleet.agents.len()
    );
    if !app.confirm(&prompt, true)? {
        app.output.info("Aborted, nothing written.");
        return Ok(ExitCode::SUCCESS);
    }

    let source = load_secret_source(&app.fs, &project.root)?;
    let ambient = ambient_env();
    let fingerprint = stack_fingerprint(&project.root);

    let outcome = provision_fleet(
        &app.stack_store(&project.root, stack),
        &app.hooks(&project.config),
        &app.fs,
        &app.reporter(),
        &app.registries,
        ProvisionRequest {
            project_root: &project.root,
            plan,
            source: &source,
            ambient: &ambient,
            fingerprint: &fingerprint,
        },
    )
    .await?;

    app.renderer()
        .render_provision(stack, &plan.schema, &outcome)?;
    Ok(ExitCode::SUCCESS)
}
