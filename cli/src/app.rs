//! Application context: unified state passed to every command handler.
//!
//! `AppContext` carries the output settings, the registries and the
//! production adapters. Commands never construct infrastructure themselves.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::LocalFs as _;
use crate::domain::config::ArmadaConfig;
use crate::domain::registry::Registries;
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
use crate::infra::config::YamlConfigStore;
use crate::infra::fs::LocalFs;
use crate::infra::git::GitCli;
use crate::infra::hooks::ShellHookRunner;
use crate::infra::pulumi::PulumiStackStore;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `ARMADA_YES` env vars).
    pub yes: bool,
    /// Project directory; the current directory when `None`.
    pub project: Option<PathBuf>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
///
/// Constructed once in `Cli::run()` and passed as `&AppContext` to all
/// command handlers.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Integration registries.
    pub registries: Registries,
    /// User configuration file.
    pub config_store: YamlConfigStore,
    /// Local filesystem.
    pub fs: LocalFs,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `ARMADA_YES`
    /// environment variables are present.
    pub non_interactive: bool,
    /// Timeout for `git` and `pulumi` invocations.
    pub cmd_timeout: Duration,
    project: Option<PathBuf>,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: AppFlags) -> Self {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("ARMADA_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            registries: Registries::builtin(),
            config_store: YamlConfigStore,
            fs: LocalFs,
            non_interactive,
            cmd_timeout: DEFAULT_CMD_TIMEOUT,
            project: flags.behaviour.project,
        }
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter for application services.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Absolute project root: `--project`, `ARMADA_PROJECT`, or the current
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not exist.
    pub fn project_root(&self) -> Result<PathBuf> {
        let dir = match &self.project {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("cannot determine current directory")?,
        };
        self.fs
            .canonicalize(&dir)
            .with_context(|| format!("project directory {} not found", dir.display()))
    }

    /// `git` adapter for identity fetches.
    #[must_use]
    pub fn git(&self) -> GitCli<TokioCommandRunner> {
        GitCli::new(TokioCommandRunner::new(self.cmd_timeout))
    }

    /// Hook runner honouring `hooks.timeout_secs`.
    #[must_use]
    pub fn hooks(&self, config: &ArmadaConfig) -> ShellHookRunner<TokioCommandRunner> {
        ShellHookRunner::new(
            TokioCommandRunner::new(self.cmd_timeout),
            Duration::from_secs(config.hooks.timeout_secs),
        )
    }

    /// Pulumi store for `stack` in the project at `project_root`.
    #[must_use]
    pub fn stack_store(
        &self,
        project_root: &Path,
        stack: &str,
    ) -> PulumiStackStore<TokioCommandRunner> {
        PulumiStackStore::new(TokioCommandRunner::new(self.cmd_timeout), project_root, stack)
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `ARMADA_YES` env),
    /// returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
