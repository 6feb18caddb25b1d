//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::config::ArmadaConfig;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(&self, program: &str, args: &[&str], timeout: Duration)
    -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
    /// Run a program with a cleared environment plus `env`, in `cwd`.
    ///
    /// `PATH` and `HOME` are carried over from the parent process.
    async fn run_isolated(
        &self,
        program: &str,
        args: &[&str],
        env: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Entry returned by [`LocalFs::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Abstracts raw filesystem access.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn write(&self, path: &Path, content: &str) -> Result<()>;
    /// Read a UTF-8 file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or not UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Entries of a directory, sorted by path.
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;
    /// Absolute form of `path`.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

// ── Git Port ──────────────────────────────────────────────────────────────────

/// Shallow-clone operations used by the identity cache.
#[allow(async_fn_in_trait)]
pub trait GitClient {
    /// Clone `url` at `revision` (default branch when `None`) into `dest`.
    async fn clone_shallow(&self, url: &str, revision: Option<&str>, dest: &Path) -> Result<()>;
    /// Bring an existing clone at `dir` up to date with its remote.
    async fn fast_forward(&self, dir: &Path, revision: Option<&str>) -> Result<()>;
}

// ── Resolution Hook Port ──────────────────────────────────────────────────────

/// Result of running a plugin's resolution hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Values the hook printed, keyed by env var.
    Resolved(BTreeMap<String, String>),
    Failed { reason: String },
}

/// Runs plugin resolution hooks.
#[allow(async_fn_in_trait)]
pub trait HookRunner {
    /// Run `script` with `env` as its whole environment.
    ///
    /// # Errors
    ///
    /// Returns an error only when the hook cannot be started at all; a hook
    /// that runs and fails yields `HookOutcome::Failed`.
    async fn run_hook(&self, script: &str, env: &BTreeMap<String, String>) -> Result<HookOutcome>;
}

// ── Remote Store Port ─────────────────────────────────────────────────────────

/// Whether `select_or_create` found an existing stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSelection {
    Created,
    Existing,
}

/// The named remote configuration store a fleet is provisioned into.
#[allow(async_fn_in_trait)]
pub trait StackStore {
    /// Select the stack named `stack`, creating it if it does not exist.
    async fn select_or_create(&self, stack: &str) -> Result<StackSelection>;
    /// Current value of `key`, `None` when unset.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, secret: bool) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Loads and saves the user configuration file.
pub trait ConfigStore {
    /// Load the configuration, defaults when the file does not exist.
    fn load(&self) -> Result<ArmadaConfig>;
    fn save(&self, config: &ArmadaConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
