//! Infrastructure implementation of the `StackStore` port.
//!
//! Drives the Pulumi CLI. Every call passes `--cwd` (the project's infra
//! program) and `--non-interactive`; config calls also name the stack
//! explicitly so a concurrently selected stack cannot be written by mistake.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::application::ports::{CommandRunner, StackSelection, StackStore};

/// Directory under the project root holding the Pulumi program.
pub const INFRA_DIR: &str = "infra";

/// Pulumi-backed stack store.
pub struct PulumiStackStore<R> {
    runner: R,
    cwd: PathBuf,
    stack: String,
}

impl<R: CommandRunner> PulumiStackStore<R> {
    pub fn new(runner: R, project_root: &Path, stack: impl Into<String>) -> Self {
        Self {
            runner,
            cwd: project_root.join(INFRA_DIR),
            stack: stack.into(),
        }
    }

    fn stack_args<'a>(&'a self, cwd: &'a str, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = args.to_vec();
        full.extend(["--stack", self.stack.as_str(), "--cwd", cwd, "--non-interactive"]);
        full
    }
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl<R: CommandRunner> StackStore for PulumiStackStore<R> {
    async fn select_or_create(&self, stack: &str) -> Result<StackSelection> {
        let cwd = self.cwd.to_string_lossy();
        let base = ["--cwd", &*cwd, "--non-interactive"];

        let mut select = vec!["stack", "select", stack];
        select.extend(base);
        let output = self.runner.run("pulumi", &select).await?;
        if output.status.success() {
            tracing::debug!(stack, "selected existing stack");
            return Ok(StackSelection::Existing);
        }

        let mut init = vec!["stack", "init", stack];
        init.extend(base);
        let output = self.runner.run("pulumi", &init).await?;
        if !output.status.success() {
            bail!("pulumi stack init {stack} failed: {}", stderr_of(&output));
        }
        tracing::info!(stack, "created stack");
        Ok(StackSelection::Created)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cwd = self.cwd.to_string_lossy();
        let args = self.stack_args(&cwd, &["config", "get", key]);
        let output = self.runner.run("pulumi", &args).await?;
        if output.status.success() {
            let value = String::from_utf8_lossy(&output.stdout);
            return Ok(Some(value.trim_end_matches(['\r', '\n']).to_string()));
        }
        let stderr = stderr_of(&output);
        if stderr.contains("not found") {
            return Ok(None);
        }
        bail!("pulumi config get {key} failed: {stderr}")
    }

    async fn set(&self, key: &str, value: &str, secret: bool) -> Result<()> {
        let cwd = self.cwd.to_string_lossy();
        let mut base = vec!["config", "set", key];
        if secret {
            base.push("--secret");
        }
        let args = self.stack_args(&cwd, &base);
        tracing::debug!(key, secret, "writing stack config");
        // Value goes through stdin so it never appears in the process list.
        let output = self
            .runner
            .run_with_stdin("pulumi", &args, value.as_bytes())
            .await?;
        if !output.status.success() {
            bail!("pulumi config set {key} failed: {}", stderr_of(&output));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let cwd = self.cwd.to_string_lossy();
        let args = self.stack_args(&cwd, &["config", "rm", key]);
        tracing::debug!(key, "removing stack config");
        let output = self.runner.run("pulumi", &args).await?;
        if !output.status.success() {
            bail!("pulumi config rm {key} failed: {}", stderr_of(&output));
        }
        Ok(())
    }
}
