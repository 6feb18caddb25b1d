// lib/crates/armada-common/src/identity.rs

use serde::{Deserialize, Serialize};

/// File name of the manifest at the root of every identity source.
pub const IDENTITY_MANIFEST_FILE: &str = "identity.yaml";

/// Prefix marking a skill that is installed from the skill hub rather than
/// shipped inside the identity.
pub const HUB_SKILL_PREFIX: &str = "hub:";

/// Identity manifest (`identity.yaml`).
///
/// Describes one agent's persona and everything it needs at runtime:
/// skills, plugins, dependencies, models and extra secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityManifest {
    pub name: String,
    pub display_name: String,
    pub role: String,
    pub emoji: String,
    pub description: String,
    /// Default disk size hint in GB.
    pub volume_size: u32,
    pub skills: Vec<SkillRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<String>,
    /// Primary model, `<provider>/<model>` or a bare model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coding_agent: Option<String>,
    /// Template variables referenced by the identity's files.
    pub template_vars: Vec<String>,
    /// Extra secrets the identity needs beyond its plugins and deps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_secrets: Vec<String>,
}

/// A skill reference: bundled with the identity, or pulled from the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkillRef {
    Bundled(String),
    External(String),
}

impl SkillRef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Bundled(name) | Self::External(name) => name,
        }
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

impl From<String> for SkillRef {
    fn from(raw: String) -> Self {
        match raw.strip_prefix(HUB_SKILL_PREFIX) {
            Some(name) => Self::External(name.to_string()),
            None => Self::Bundled(raw),
        }
    }
}

impl From<SkillRef> for String {
    fn from(skill: SkillRef) -> Self {
        match skill {
            SkillRef::Bundled(name) => name,
            SkillRef::External(name) => format!("{HUB_SKILL_PREFIX}{name}"),
        }
    }
}
