//! `armada schema`: print every value the fleet needs.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::load_project;

/// Run the schema command.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let project = load_project(app).await?;
    app.renderer()
        .render_schema(&project.plan.fleet.stack_name, &project.plan.schema)?;
    Ok(ExitCode::SUCCESS)
}
