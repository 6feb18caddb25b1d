//! Infrastructure implementation of the `HookRunner` port.
//!
//! Runs a plugin's resolution script with `sh -c` in an isolated
//! environment and reads `KEY=value` lines from its stdout.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, HookOutcome, HookRunner};

/// Shell-script hook runner.
pub struct ShellHookRunner<R> {
    runner: R,
    timeout: Duration,
}

impl<R: CommandRunner> ShellHookRunner<R> {
    #[must_use]
    pub fn new(runner: R, timeout: Duration) -> Self {
        Self { runner, timeout }
    }
}

impl<R: CommandRunner> HookRunner for ShellHookRunner<R> {
    async fn run_hook(&self, script: &str, env: &BTreeMap<String, String>) -> Result<HookOutcome> {
        let output = match self
            .runner
            .run_isolated("sh", &["-c", script], env, self.timeout)
            .await
        {
            Ok(output) => output,
            Err(e) if e.to_string().contains("timed out") => {
                return Ok(HookOutcome::Failed {
                    reason: format!("hook timed out after {}s", self.timeout.as_secs()),
                });
            }
            Err(e) => {
                return Ok(HookOutcome::Failed {
                    reason: format!("could not run hook: {e:#}"),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("hook exited with {}", output.status),
                msg => msg.to_string(),
            };
            return Ok(HookOutcome::Failed { reason });
        }
        Ok(HookOutcome::Resolved(parse_hook_output(
            &String::from_utf8_lossy(&output.stdout),
        )))
    }
}

/// `KEY=value` lines; anything else is ignored.
#[must_use]
pub fn parse_hook_output(stdout: &str) -> BTreeMap<String, String> {
    stdout
        .lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once('=')?;
            let key = key.trim();
            let valid = !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
            valid.then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}
