//! Infrastructure implementation of the `GitClient` port.
//!
//! Shells out to `git` through a `CommandRunner`.

use std::path::Path;

use anyhow::{Result, bail};

use crate::application::ports::{CommandRunner, GitClient};

/// `git` CLI adapter.
pub struct GitCli<R> {
    runner: R,
}

impl<R: CommandRunner> GitCli<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn git(&self, args: &[&str]) -> Result<()> {
        let output = self.runner.run("git", args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git {} failed: {}", args.first().unwrap_or(&""), stderr.trim());
        }
        Ok(())
    }
}

impl<R: CommandRunner> GitClient for GitCli<R> {
    async fn clone_shallow(&self, url: &str, revision: Option<&str>, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        match revision {
            // `--branch` accepts branches and tags.
            Some(rev) => {
                let cloned = self
                    .git(&["clone", "--depth", "1", "--branch", rev, "--", url, &dest])
                    .await;
                if cloned.is_ok() {
                    return Ok(());
                }
                // A commit id: fetch it explicitly.
                self.git(&["init", "--quiet", &dest]).await?;
                self.git(&["-C", &dest, "remote", "add", "origin", url]).await?;
                self.git(&["-C", &dest, "fetch", "--depth", "1", "origin", rev])
                    .await?;
                self.git(&["-C", &dest, "checkout", "--quiet", "FETCH_HEAD"])
                    .await
            }
            None => self.git(&["clone", "--depth", "1", "--", url, &dest]).await,
        }
    }

    async fn fast_forward(&self, dir: &Path, revision: Option<&str>) -> Result<()> {
        let dir = dir.to_string_lossy();
        match revision {
            Some(rev) => {
                self.git(&["-C", &dir, "fetch", "--depth", "1", "origin", rev])
                    .await?;
                self.git(&["-C", &dir, "checkout", "--quiet", "FETCH_HEAD"])
                    .await
            }
            None => {
                self.git(&["-C", &dir, "pull", "--ff-only", "--depth", "1"])
                    .await
            }
        }
    }
}
