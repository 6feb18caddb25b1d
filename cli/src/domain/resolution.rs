//! Pure stages of secret resolution.
//!
//! The effectful auto-resolve stage lives in
//! `application::services::secret_resolution`; everything here is a function
//! of its inputs.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::error::SecretError;
use crate::domain::schema::{SecretRequirement, SecretSchema};

/// Operator-supplied values, keyed by source key (`.env` names).
pub type SecretSource = BTreeMap<String, String>;

/// Values keyed by env var: globals plus one map per agent role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSecrets {
    pub global: BTreeMap<String, String>,
    pub per_agent: BTreeMap<String, BTreeMap<String, String>>,
}

impl ResolvedSecrets {
    /// Value resolved for `req`, if any.
    #[must_use]
    pub fn get(&self, req: &SecretRequirement) -> Option<&str> {
        let map = match req.agent() {
            None => Some(&self.global),
            Some(role) => self.per_agent.get(role),
        };
        map.and_then(|m| m.get(&req.env_var)).map(String::as_str)
    }

    pub fn set(&mut self, req: &SecretRequirement, value: String) {
        let map = match req.agent() {
            None => &mut self.global,
            Some(role) => self.per_agent.entry(role.to_string()).or_default(),
        };
        map.insert(req.env_var.clone(), value);
    }

    /// Environment a hook sees for `role`: globals overlaid by the agent's
    /// own values, keyed by unprefixed env var.
    #[must_use]
    pub fn agent_env(&self, role: &str) -> BTreeMap<String, String> {
        let mut env = self.global.clone();
        if let Some(own) = self.per_agent.get(role) {
            env.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        env
    }
}

/// A required value with nothing behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingSecret {
    pub source_key: String,
    pub env_var: String,
    /// Owning agent role; `None` for global values.
    pub agent: Option<String>,
    pub hint: String,
    pub auto_resolvable: bool,
}

impl MissingSecret {
    fn from_requirement(req: &SecretRequirement) -> Self {
        Self {
            source_key: req.source_key.clone(),
            env_var: req.env_var.clone(),
            agent: req.agent().map(str::to_string),
            hint: req.validator.hint().to_string(),
            auto_resolvable: req.auto_resolvable,
        }
    }

    /// `PM_LINEAR_WEBHOOK_SECRET (agent pm): a non-empty value`
    #[must_use]
    pub fn describe(&self) -> String {
        let owner = match &self.agent {
            Some(role) => format!("agent {role}"),
            None => "global".to_string(),
        };
        format!("{} ({owner}): {}", self.source_key, self.hint)
    }
}

/// A value that failed its format check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub source_key: String,
    pub agent: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source_key, self.message)
    }
}

/// Result of [`prune`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pruned {
    /// Previous global values still required, keyed by env var.
    pub baseline: BTreeMap<String, String>,
    /// Managed env vars a previous run wrote that nothing requires now.
    pub removed: BTreeSet<String>,
}

// ── Stage 1: prune ───────────────────────────────────────────────────────────

/// Drops previously persisted globals the schema no longer needs.
///
/// Keys outside `managed_global_keys` are never reported as removed.
#[must_use]
pub fn prune(previous: &BTreeMap<String, String>, schema: &SecretSchema) -> Pruned {
    let mut pruned = Pruned::default();
    for (env_var, value) in previous {
        if schema.global_requirement(env_var).is_some() {
            pruned.baseline.insert(env_var.clone(), value.clone());
        } else if schema.managed_global_keys.contains_key(env_var) {
            pruned.removed.insert(env_var.clone());
        }
    }
    pruned
}

// ── Stage 2: merge ───────────────────────────────────────────────────────────

/// Overlays source values on the pruned baseline.
///
/// Blank source values count as absent.
#[must_use]
pub fn merge(
    baseline: &BTreeMap<String, String>,
    schema: &SecretSchema,
    source: &SecretSource,
) -> ResolvedSecrets {
    let mut resolved = ResolvedSecrets {
        global: baseline.clone(),
        per_agent: schema
            .agents
            .iter()
            .map(|a| (a.role.clone(), BTreeMap::new()))
            .collect(),
    };
    for req in schema.all() {
        if let Some(value) = lookup(source, &req.source_key) {
            resolved.set(req, value.to_string());
        }
    }
    resolved
}

/// Non-blank value for `key`, trimmed.
#[must_use]
pub fn lookup<'a>(map: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

// ── Stage 3: diff ────────────────────────────────────────────────────────────

/// Requirements with no value after merge, in schema order.
#[must_use]
pub fn diff<'s>(
    schema: &'s SecretSchema,
    resolved: &ResolvedSecrets,
) -> Vec<&'s SecretRequirement> {
    schema
        .all()
        .filter(|req| resolved.get(req).is_none_or(|v| v.trim().is_empty()))
        .collect()
}

// ── Stage 4: validate ────────────────────────────────────────────────────────

/// Runs every resolved value's validator. Failures are warnings only.
#[must_use]
pub fn validate(schema: &SecretSchema, resolved: &ResolvedSecrets) -> Vec<ValidationWarning> {
    schema
        .all()
        .filter_map(|req| {
            let value = resolved.get(req)?;
            let message = req.validator.check(value).err()?;
            Some(ValidationWarning {
                source_key: req.source_key.clone(),
                agent: req.agent().map(str::to_string),
                message,
            })
        })
        .collect()
}

// ── Stage 5: filter auto-resolvable ──────────────────────────────────────────

/// Splits missing requirements into `(deferred, blocking)`.
#[must_use]
pub fn partition_auto_resolvable<'s>(
    missing: Vec<&'s SecretRequirement>,
) -> (Vec<&'s SecretRequirement>, Vec<&'s SecretRequirement>) {
    missing.into_iter().partition(|req| req.auto_resolvable)
}

// ── Stage 7: recompute missing ───────────────────────────────────────────────

/// Fails with every requirement still missing.
///
/// # Errors
///
/// `SecretError::MissingSecrets` listing all of them at once.
pub fn ensure_complete(
    schema: &SecretSchema,
    resolved: &ResolvedSecrets,
) -> Result<(), SecretError> {
    let missing: Vec<MissingSecret> = diff(schema, resolved)
        .into_iter()
        .map(MissingSecret::from_requirement)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SecretError::MissingSecrets(missing))
    }
}
