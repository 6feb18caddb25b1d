//! Application service: identity fetching and caching.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use armada_common::{FleetAgent, IDENTITY_MANIFEST_FILE, IdentityManifest};
use futures_util::future::try_join_all;

use crate::application::ports::{GitClient, LocalFs};
use crate::domain::error::IdentityError;
use crate::domain::identity::{IdentitySource, cache_key, parse_identity_manifest};

/// A resolved identity: its manifest plus every other file it ships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedIdentity {
    pub manifest: IdentityManifest,
    /// Directory holding `identity.yaml`.
    pub root: PathBuf,
    /// Relative path (`/`-separated) → UTF-8 content.
    pub files: BTreeMap<String, String>,
}

/// Resolves a single identity reference.
///
/// Relative local paths resolve against `project_root`. Remote sources are
/// cached under `cache_root`.
///
/// # Errors
///
/// `IdentityNotFound`, `ManifestParse`, `ManifestValidation` or `Fetch`.
pub async fn fetch_identity(
    git: &impl GitClient,
    fs: &impl LocalFs,
    source: &str,
    revision: Option<&str>,
    project_root: &Path,
    cache_root: &Path,
) -> Result<FetchedIdentity> {
    let source = IdentitySource::parse(source);
    if let IdentitySource::Remote { url, .. } = &source {
        fs.create_dir_all(cache_root)?;
        sync_repo(git, fs, url, revision, &cache_root.join(cache_key(url, revision))).await?;
    }
    let dir = identity_dir(fs, &source, revision, project_root, cache_root)?;
    load_identity(fs, &dir)
}

/// Resolves every agent's identity, fetching each distinct remote
/// repository once and concurrently.
///
/// Results are in the same order as `agents`.
///
/// # Errors
///
/// The first fetch or manifest error aborts the whole run.
pub async fn fetch_fleet_identities(
    git: &impl GitClient,
    fs: &impl LocalFs,
    agents: &[FleetAgent],
    project_root: &Path,
    cache_root: &Path,
) -> Result<Vec<FetchedIdentity>> {
    let sources: Vec<IdentitySource> = agents
        .iter()
        .map(|a| IdentitySource::parse(&a.identity))
        .collect();

    let mut repos: BTreeMap<String, (&str, Option<&str>)> = BTreeMap::new();
    for (agent, source) in agents.iter().zip(&sources) {
        if let IdentitySource::Remote { url, .. } = source {
            let revision = agent.identity_version.as_deref();
            repos
                .entry(cache_key(url, revision))
                .or_insert((url.as_str(), revision));
        }
    }

    if !repos.is_empty() {
        fs.create_dir_all(cache_root)?;
        try_join_all(repos.iter().map(|(key, (url, revision))| {
            sync_repo(git, fs, url, *revision, cache_root.join(key))
        }))
        .await?;
    }

    agents
        .iter()
        .zip(&sources)
        .map(|(agent, source)| {
            let dir = identity_dir(
                fs,
                source,
                agent.identity_version.as_deref(),
                project_root,
                cache_root,
            )?;
            load_identity(fs, &dir)
                .with_context(|| format!("loading identity for agent '{}'", agent.name))
        })
        .collect()
}

/// Brings the cached clone at `dir` up to date, re-cloning when the
/// fast-forward fails.
async fn sync_repo(
    git: &impl GitClient,
    fs: &impl LocalFs,
    url: &str,
    revision: Option<&str>,
    dir: impl AsRef<Path>,
) -> Result<()> {
    let dir = dir.as_ref();
    let update = if fs.exists(dir) {
        match git.fast_forward(dir, revision).await {
            Ok(()) => {
                tracing::debug!(url, dir = %dir.display(), "identity cache updated");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "stale identity cache, re-cloning");
                fs.remove_dir_all(dir)?;
                Some(format!("{e:#}"))
            }
        }
    } else {
        None
    };

    git.clone_shallow(url, revision, dir)
        .await
        .map_err(|e| IdentityError::Fetch {
            url: url.to_string(),
            update,
            clone: format!("{e:#}"),
        })?;
    tracing::debug!(url, dir = %dir.display(), "identity cloned");
    Ok(())
}

fn identity_dir(
    fs: &impl LocalFs,
    source: &IdentitySource,
    revision: Option<&str>,
    project_root: &Path,
    cache_root: &Path,
) -> Result<PathBuf> {
    let dir = match source {
        IdentitySource::Local(path) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                project_root.join(path)
            };
            if !fs.is_dir(&path) {
                return Err(IdentityError::NotFound(format!(
                    "{} is not a directory",
                    path.display()
                ))
                .into());
            }
            path
        }
        IdentitySource::Remote { url, subpath } => {
            let clone = cache_root.join(cache_key(url, revision));
            let dir = subpath.as_ref().map_or_else(|| clone.clone(), |sub| clone.join(sub));
            if !fs.is_dir(&dir) {
                return Err(IdentityError::NotFound(format!(
                    "{url}#{} does not exist in the repository",
                    subpath.as_deref().unwrap_or_default()
                ))
                .into());
            }
            dir
        }
    };
    Ok(dir)
}

/// Parses `identity.yaml` in `dir` and collects the remaining files.
///
/// # Errors
///
/// `IdentityNotFound` when there is no manifest, or a manifest error.
pub fn load_identity(fs: &impl LocalFs, dir: &Path) -> Result<FetchedIdentity> {
    let manifest_path = dir.join(IDENTITY_MANIFEST_FILE);
    if !fs.exists(&manifest_path) {
        return Err(IdentityError::NotFound(format!(
            "{} has no {IDENTITY_MANIFEST_FILE}",
            dir.display()
        ))
        .into());
    }
    let content = fs.read_to_string(&manifest_path)?;
    let manifest = parse_identity_manifest(&content, &manifest_path.display().to_string())?;

    let mut files = BTreeMap::new();
    collect_files(fs, dir, "", &mut files)?;
    Ok(FetchedIdentity {
        manifest,
        root: dir.to_path_buf(),
        files,
    })
}

fn collect_files(
    fs: &impl LocalFs,
    dir: &Path,
    prefix: &str,
    out: &mut BTreeMap<String, String>,
) -> Result<()> {
    for entry in fs.read_dir(dir)? {
        let Some(name) = entry.path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let rel = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };
        if entry.is_dir {
            collect_files(fs, &entry.path, &rel, out)?;
        } else if rel != IDENTITY_MANIFEST_FILE {
            match fs.read_to_string(&entry.path) {
                Ok(content) => {
                    out.insert(rel, content);
                }
                Err(e) => tracing::debug!(file = %rel, error = %e, "skipping unreadable file"),
            }
        }
    }
    Ok(())
}
