//! `armada fingerprint`: print the project's stack fingerprint.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::domain::stack::stack_fingerprint;

/// Run the fingerprint command.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let root = app.project_root()?;
    app.renderer()
        .render_fingerprint(&root, &stack_fingerprint(&root))?;
    Ok(ExitCode::SUCCESS)
}
