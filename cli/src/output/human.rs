//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::application::ports::StackSelection;
use crate::application::services::provisioning::ProvisionOutcome;
use crate::application::services::secret_resolution::Resolution;
use crate::domain::config::{ArmadaConfig, VALID_CONFIG_KEYS};
use crate::domain::schema::{SecretRequirement, SecretSchema};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("armada {version}");
    }

    /// Render every requirement, global first, then per agent.
    pub fn render_schema(&self, stack: &str, schema: &SecretSchema) {
        println!();
        self.ctx.header(&format!("Secret schema for stack '{stack}'"));
        println!();
        self.render_group("Global", &schema.global);
        for agent in &schema.agents {
            println!();
            self.render_group(
                &format!(
                    "Agent {} ({}, role {})",
                    agent.display_name, agent.name, agent.role
                ),
                &agent.requirements,
            );
        }
        println!();
        let total = schema.all().count();
        self.ctx.info(&format!(
            "{total} value(s); set them in .env (see .env.example)"
        ));
    }

    fn render_group(&self, title: &str, requirements: &[SecretRequirement]) {
        println!("  {}", title.style(self.ctx.styles.bold));
        if requirements.is_empty() {
            println!("    {}", "(none)".style(self.ctx.styles.dim));
            return;
        }
        for req in requirements {
            let class = if req.is_secret { "secret" } else { "plain " };
            println!(
                "    {:<32} {}  {}",
                req.source_key,
                class.style(if req.is_secret {
                    self.ctx.styles.secret
                } else {
                    self.ctx.styles.dim
                }),
                format_sources(req).style(self.ctx.styles.dim)
            );
        }
    }

    /// Render a successful resolution.
    pub fn render_validation(&self, schema: &SecretSchema, resolution: &Resolution) {
        self.ctx.success(&format!(
            "all {} value(s) resolved",
            schema.all().count()
        ));
        self.render_resolution_details(resolution);
    }

    fn render_resolution_details(&self, resolution: &Resolution) {
        for key in &resolution.auto_resolved {
            self.ctx.info(&format!("{key} auto-resolved"));
        }
        for env_var in &resolution.pruned {
            self.ctx.info(&format!("{env_var} no longer required, pruned"));
        }
        if !resolution.warnings.is_empty() {
            self.ctx.warn(&format!(
                "{} value(s) did not match their expected format",
                resolution.warnings.len()
            ));
        }
    }

    /// Render a completed provisioning run.
    pub fn render_provision(&self, stack: &str, outcome: &ProvisionOutcome) {
        self.render_resolution_details(&outcome.resolution);
        println!();
        let verb = match outcome.selection {
            StackSelection::Created => "Created",
            StackSelection::Existing => "Updated",
        };
        self.ctx.header(&format!("{verb} stack '{stack}'"));
        self.ctx.kv("Written:  ", &outcome.report.written.len().to_string());
        self.ctx.kv("Unchanged:", &outcome.report.unchanged.len().to_string());
        self.ctx.kv("Removed:  ", &outcome.report.removed.len().to_string());
        for key in &outcome.report.removed {
            self.ctx.info(&format!("removed {key}"));
        }
    }

    /// Render the project fingerprint.
    pub fn render_fingerprint(&self, project_root: &Path, fingerprint: &str) {
        if self.ctx.quiet {
            println!("{fingerprint}");
            return;
        }
        self.ctx.kv("Project:    ", &project_root.display().to_string());
        self.ctx.kv("Fingerprint:", fingerprint);
    }

    /// Render the current armada configuration.
    pub fn render_config(&self, config: &ArmadaConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for key in VALID_CONFIG_KEYS {
            let value = config.get(key).unwrap_or_else(|| "(default)".to_string());
            println!("  {:<20} {value}", format!("{key}:"));
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["ARMADA_CONFIG", "ARMADA_PROJECT", "ARMADA_LOG", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }

    /// Confirm a configuration change.
    pub fn render_config_set(&self, key: &str, value: &str) {
        self.ctx.success(&format!("Set {key} = {value}"));
    }
}

// ── Display helpers (used by tests and output layer) ─────────────────────────

/// Where a requirement comes from, e.g. `plugin linear, identity`.
#[must_use]
pub fn format_sources(req: &SecretRequirement) -> String {
    req.sources
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
