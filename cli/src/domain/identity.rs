//! Identity source parsing and manifest validation.
//!
//! Pure functions only: no I/O, no async, no filesystem access. Fetching
//! lives in `application::services::identity_fetch`.

use std::path::PathBuf;

use armada_common::IdentityManifest;
use serde_yaml::{Mapping, Value};

use crate::domain::error::IdentityError;
use crate::domain::stack::short_digest;

const REMOTE_PREFIXES: &[&str] = &["https://", "http://", "ssh://", "git@", "file://"];

/// Where an identity lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    Local(PathBuf),
    Remote {
        url: String,
        /// Directory inside the repository holding `identity.yaml`.
        subpath: Option<String>,
    },
}

impl IdentitySource {
    /// Parses a fleet manifest `identity` value.
    ///
    /// Anything that is not a recognised remote URL is a local path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !REMOTE_PREFIXES.iter().any(|p| raw.starts_with(p)) {
            return Self::Local(PathBuf::from(raw));
        }
        match raw.split_once('#') {
            Some((url, sub)) => {
                let sub = sub.trim_matches('/');
                Self::Remote {
                    url: url.to_string(),
                    subpath: (!sub.is_empty()).then(|| sub.to_string()),
                }
            }
            None => Self::Remote {
                url: raw.to_string(),
                subpath: None,
            },
        }
    }
}

/// Canonical form of a repository URL, so equivalent spellings share a
/// cache entry.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let mut url = url.trim().trim_end_matches('/');
    if let Some(stripped) = url.strip_suffix(".git") {
        url = stripped;
    }
    let url = url.trim_end_matches('/');

    // scheme://host/path  or  git@host:path
    if let Some((scheme, rest)) = url.split_once("://") {
        let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
        let mut out = format!("{}://{}", scheme.to_ascii_lowercase(), host.to_ascii_lowercase());
        if !path.is_empty() {
            out.push('/');
            out.push_str(path);
        }
        out
    } else if let Some((user_host, path)) = url.split_once(':') {
        format!("{}:{path}", user_host.to_ascii_lowercase())
    } else {
        url.to_string()
    }
}

/// Cache directory name for a remote identity at an optional pinned revision.
#[must_use]
pub fn cache_key(url: &str, revision: Option<&str>) -> String {
    let mut input = normalize_url(url);
    if let Some(rev) = revision {
        input.push('@');
        input.push_str(rev);
    }
    short_digest(&input)
}

// ── Manifest validation ──────────────────────────────────────────────────────

const REQUIRED_STRINGS: &[&str] = &["name", "displayName", "role", "emoji", "description"];
const REQUIRED_ARRAYS: &[&str] = &["skills", "templateVars"];

/// Checks presence and type of every required manifest field.
///
/// Returns one entry per offending field; empty when the document is valid.
#[must_use]
pub fn validate_identity_document(doc: &Value) -> Vec<String> {
    let Some(map) = doc.as_mapping() else {
        return vec!["document (expected a mapping)".to_string()];
    };
    let mut problems = Vec::new();

    for field in REQUIRED_STRINGS {
        match lookup(map, field) {
            None | Some(Value::Null) => problems.push(format!("{field} (missing)")),
            Some(Value::String(_)) => {}
            Some(_) => problems.push(format!("{field} (expected a string)")),
        }
    }

    match lookup(map, "volumeSize") {
        None | Some(Value::Null) => problems.push("volumeSize (missing)".to_string()),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) if v > 0 && u32::try_from(v).is_ok() => {}
            _ => problems.push("volumeSize (expected a positive whole number)".to_string()),
        },
        Some(_) => problems.push("volumeSize (expected a number)".to_string()),
    }

    for field in REQUIRED_ARRAYS {
        match lookup(map, field) {
            None | Some(Value::Null) => problems.push(format!("{field} (missing)")),
            Some(Value::Sequence(_)) => {}
            Some(_) => problems.push(format!("{field} (expected an array)")),
        }
    }

    problems
}

fn lookup<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(Value::String(key.to_string()))
}

/// Parses and validates `identity.yaml` content.
///
/// # Errors
///
/// `ManifestParse` when the YAML is malformed or a field has the wrong
/// shape, `ManifestValidation` listing every missing or mistyped required
/// field.
pub fn parse_identity_manifest(
    content: &str,
    path: &str,
) -> Result<IdentityManifest, IdentityError> {
    let doc: Value = serde_yaml::from_str(content).map_err(|e| IdentityError::ManifestParse {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    let problems = validate_identity_document(&doc);
    if !problems.is_empty() {
        return Err(IdentityError::ManifestValidation {
            path: path.to_string(),
            problems,
        });
    }

    serde_yaml::from_value(doc).map_err(|e| IdentityError::ManifestParse {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Template variable names referenced by a manifest, in declaration order.
#[must_use]
pub fn referenced_template_vars(manifest: &IdentityManifest) -> impl Iterator<Item = &str> {
    manifest.template_vars.iter().map(String::as_str)
}
