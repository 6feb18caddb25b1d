//! Domain types and validators for armada user configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &["cache.dir", "hooks.timeout_secs"];
pub const DEFAULT_HOOK_TIMEOUT_SECS: u64 = 30;
pub const MAX_HOOK_TIMEOUT_SECS: u64 = 600;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.armada/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ArmadaConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub hooks: HooksConfig,
}

/// Identity cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Cache root; `~/.armada/cache/identities` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Resolution hook settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HooksConfig {
    #[serde(default = "default_hook_timeout")]
    pub timeout_secs: u64,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_hook_timeout(),
        }
    }
}

fn default_hook_timeout() -> u64 {
    DEFAULT_HOOK_TIMEOUT_SECS
}

impl ArmadaConfig {
    /// Current value of `key` rendered for display.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "cache.dir" => self.cache.dir.as_ref().map(|p| p.display().to_string()),
            "hooks.timeout_secs" => Some(self.hooks.timeout_secs.to_string()),
            _ => None,
        }
    }

    /// Applies an already validated `key`/`value` pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "cache.dir" => self.cache.dir = Some(PathBuf::from(value)),
            "hooks.timeout_secs" => self.hooks.timeout_secs = parse_timeout(value)?,
            _ => {}
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    match key {
        "cache.dir" if value.trim().is_empty() => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            valid: "a directory path".to_string(),
        }
        .into()),
        "hooks.timeout_secs" => parse_timeout(value).map(|_| ()),
        _ => Ok(()),
    }
}

fn parse_timeout(value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(secs) if (1..=MAX_HOOK_TIMEOUT_SECS).contains(&secs) => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            key: "hooks.timeout_secs".to_string(),
            value: value.to_string(),
            valid: format!("a whole number of seconds from 1 to {MAX_HOOK_TIMEOUT_SECS}"),
        }
        .into()),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
