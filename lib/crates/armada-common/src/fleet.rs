// lib/crates/armada-common/src/fleet.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fleet manifest (`armada.yaml`) at the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetManifest {
    pub stack_name: String,
    pub provider: CloudProvider,
    /// AWS region or Hetzner location.
    pub region: String,
    /// Default instance size for every agent.
    pub instance_type: String,
    #[serde(default)]
    pub owner: OwnerInfo,
    /// Values for the template variables identities reference.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub template_vars: BTreeMap<String, String>,
    pub agents: Vec<FleetAgent>,
}

/// Supported cloud providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Hetzner,
}

impl CloudProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Hetzner => "hetzner",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner metadata rendered into identity templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<String>,
}

/// One agent entry in the fleet manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetAgent {
    pub name: String,
    pub display_name: String,
    pub role: String,
    /// Local path or `<git-url>[#<subpath>]`.
    pub identity: String,
    /// Pinned branch, tag or commit for remote identities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    /// Per-plugin settings, e.g. `plugins.linear.userUuid`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, BTreeMap<String, ConfigValue>>,
}

impl FleetAgent {
    /// Look up a plugin setting rendered as text.
    #[must_use]
    pub fn plugin_setting(&self, plugin: &str, key: &str) -> Option<String> {
        self.plugins
            .get(plugin)
            .and_then(|settings| settings.get(key))
            .map(ConfigValue::to_string)
    }
}

/// A scalar plugin setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}
