//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` runs processes with tokio and guarantees the child
//! is killed when a timeout fires.

use std::collections::BTreeMap;
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::application::ports::CommandRunner;

/// Default timeout for `git` and `pulumi` invocations.
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(120);

/// Variables carried into an isolated environment.
const INHERITED_VARS: &[&str] = &["PATH", "HOME"];

/// Production `CommandRunner`.
///
/// `tokio::time::timeout` around `.output().await` drops the future but
/// leaves the OS process running on some platforms, so the wait races an
/// explicit `child.kill()` in `tokio::select!`.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

fn spawn(mut cmd: Command, program: &str, stdin: bool) -> Result<Child> {
    cmd.stdin(if stdin { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))
}

async fn wait_with_timeout(mut child: Child, program: &str, timeout: Duration) -> Result<Output> {
    let mut stdout_handle = child.stdout.take();
    let mut stderr_handle = child.stderr.take();

    tokio::select! {
        result = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stdout_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stderr_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
            );
            Ok(Output {
                status: status.with_context(|| format!("waiting for {program}"))?,
                stdout,
                stderr,
            })
        } => result,
        () = tokio::time::sleep(timeout) => {
            let _ = child.kill().await;
            anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
        }
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        tracing::debug!(program, ?args, "running command");
        let mut cmd = Command::new(program);
        cmd.args(args);
        let child = spawn(cmd, program, false)?;
        wait_with_timeout(child, program, timeout).await
    }

    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output> {
        tracing::debug!(program, ?args, "running command with stdin");
        let mut cmd = Command::new(program);
        cmd.args(args);
        let mut child = spawn(cmd, program, true)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input)
                .await
                .with_context(|| format!("writing stdin of {program}"))?;
            // Dropping closes the pipe so the child sees EOF.
            drop(stdin);
        }
        wait_with_timeout(child, program, self.timeout).await
    }

    async fn run_isolated(
        &self,
        program: &str,
        args: &[&str],
        env: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Output> {
        tracing::debug!(program, vars = env.len(), "running isolated command");
        let mut cmd = Command::new(program);
        cmd.args(args).env_clear();
        for var in INHERITED_VARS {
            if let Ok(value) = std::env::var(var) {
                cmd.env(var, value);
            }
        }
        cmd.envs(env);
        let child = spawn(cmd, program, false)?;
        wait_with_timeout(child, program, timeout).await
    }
}
