//! Output formatting module

pub mod human;
pub mod json;
pub mod reporter;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;
pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::application::services::provisioning::ProvisionOutcome;
use crate::application::services::secret_resolution::Resolution;
use crate::domain::config::ArmadaConfig;
use crate::domain::schema::SecretSchema;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Output renderer selected by `--json`.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// Render the secret schema.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_schema(&self, stack: &str, schema: &SecretSchema) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_schema(stack, schema);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_schema(stack, schema),
        }
    }

    /// Render a successful resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_validation(&self, schema: &SecretSchema, resolution: &Resolution) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_validation(schema, resolution);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_validation(schema, resolution),
        }
    }

    /// Render a completed provisioning run.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_provision(
        &self,
        stack: &str,
        schema: &SecretSchema,
        outcome: &ProvisionOutcome,
    ) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_provision(stack, outcome);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_provision(stack, schema, outcome),
        }
    }

    /// Render the project fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_fingerprint(&self, project_root: &Path, fingerprint: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_fingerprint(project_root, fingerprint);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_fingerprint(project_root, fingerprint),
        }
    }

    /// Render the user configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &ArmadaConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_config(config, path);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_config(config, path),
        }
    }

    /// Render a configuration value that was just set.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config_set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_config_set(key, value);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_config_set(key, value),
        }
    }

    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_version(version);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_version(version),
        }
    }
}
