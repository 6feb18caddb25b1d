//! Registry layer: static lookup tables for coding agents, dependencies,
//! plugins and model providers.
//!
//! Tables are built once at startup (`Registries::builtin()`) and passed
//! explicitly to the schema builder. Tests build their own with the
//! `with_*` methods. Pure data and lookup only.

pub mod builtin;
pub mod validator;

use std::collections::BTreeMap;

use armada_common::CloudProvider;
use serde::Serialize;

use crate::domain::stack::env_to_store_key;
pub use validator::Validator;

/// Where a secret is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretScope {
    /// One value per agent.
    Agent,
    /// One value for the whole fleet, however many agents need it.
    Provider,
}

/// One secret a registry entry needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSpec {
    /// Registry-local key, also the key used in plugin config blocks.
    pub key: String,
    pub env_var: String,
    pub validator: Validator,
    pub is_secret: bool,
    pub auto_resolvable: bool,
    pub scope: SecretScope,
    /// Explicit store key; derived from `env_var` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_key: Option<String>,
}

impl SecretSpec {
    /// An agent-scoped encrypted secret.
    #[must_use]
    pub fn secret(key: &str, env_var: &str, validator: Validator) -> Self {
        Self {
            key: key.to_string(),
            env_var: env_var.to_string(),
            validator,
            is_secret: true,
            auto_resolvable: false,
            scope: SecretScope::Agent,
            store_key: None,
        }
    }

    /// An agent-scoped value stored in cleartext.
    #[must_use]
    pub fn plaintext(key: &str, env_var: &str, validator: Validator) -> Self {
        Self {
            is_secret: false,
            ..Self::secret(key, env_var, validator)
        }
    }

    #[must_use]
    pub fn provider_scoped(mut self) -> Self {
        self.scope = SecretScope::Provider;
        self
    }

    #[must_use]
    pub fn auto_resolvable(mut self) -> Self {
        self.auto_resolvable = true;
        self
    }

    #[must_use]
    pub fn with_store_key(mut self, store_key: &str) -> Self {
        self.store_key = Some(store_key.to_string());
        self
    }

    /// Key this secret is written under when it is fleet-global.
    #[must_use]
    pub fn global_store_key(&self) -> String {
        self.store_key
            .clone()
            .unwrap_or_else(|| env_to_store_key(&self.env_var))
    }

    /// Metadata that must agree when two entries declare the same env var.
    #[must_use]
    pub fn classification(&self) -> (Validator, bool, SecretScope) {
        (self.validator, self.is_secret, self.scope)
    }
}

/// A script that can look up missing values automatically.
///
/// Runs with the agent's known values in its environment and prints
/// `KEY=value` lines on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveHook {
    pub script: String,
}

/// A coding-agent backend, dependency or plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub id: String,
    pub display_name: String,
    pub secrets: Vec<SecretSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_install: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_hook: Option<ResolveHook>,
}

impl RegistryEntry {
    #[must_use]
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            secrets: Vec::new(),
            install: None,
            post_install: None,
            resolve_hook: None,
        }
    }

    #[must_use]
    pub fn with_secret(mut self, spec: SecretSpec) -> Self {
        self.secrets.push(spec);
        self
    }

    #[must_use]
    pub fn with_install(mut self, script: &str) -> Self {
        self.install = Some(script.to_string());
        self
    }

    #[must_use]
    pub fn with_post_install(mut self, script: &str) -> Self {
        self.post_install = Some(script.to_string());
        self
    }

    #[must_use]
    pub fn with_resolve_hook(mut self, script: &str) -> Self {
        self.resolve_hook = Some(ResolveHook {
            script: script.to_string(),
        });
        self
    }
}

/// An AI-model provider and the credential it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProvider {
    pub id: String,
    pub display_name: String,
    pub credential: SecretSpec,
}

/// Which table an identifier was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    CodingAgent,
    Dependency,
    Plugin,
    ModelProvider,
}

impl RegistryKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::CodingAgent => "coding agent",
            Self::Dependency => "dependency",
            Self::Plugin => "plugin",
            Self::ModelProvider => "model provider",
        }
    }
}

/// Result of looking up an identifier an identity references.
///
/// `Unknown` lets an older CLI keep working against an identity that names
/// an integration it does not know yet; callers warn and skip.
#[derive(Debug)]
pub enum Integration<'a> {
    Known(&'a RegistryEntry),
    Unknown { kind: RegistryKind, id: String },
}

impl Integration<'_> {
    /// User-facing warning for an unknown identifier, `None` when known.
    #[must_use]
    pub fn warning(&self, role: &str) -> Option<String> {
        match self {
            Self::Known(_) => None,
            Self::Unknown { kind, id } => Some(format!(
                "agent '{role}' references unknown {} '{id}'; skipping its secrets (is armada up to date?)",
                kind.label()
            )),
        }
    }
}

/// Immutable lookup tables consulted by the schema builder.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    coding_agents: BTreeMap<String, RegistryEntry>,
    dependencies: BTreeMap<String, RegistryEntry>,
    plugins: BTreeMap<String, RegistryEntry>,
    model_providers: BTreeMap<String, ModelProvider>,
    default_model_provider: String,
    default_coding_agent: String,
    infrastructure: Vec<SecretSpec>,
    cloud: BTreeMap<CloudProvider, Vec<SecretSpec>>,
}

impl Registries {
    /// Empty tables; the starting point for test fixtures.
    #[must_use]
    pub fn empty(default_model_provider: &str, default_coding_agent: &str) -> Self {
        Self {
            default_model_provider: default_model_provider.to_string(),
            default_coding_agent: default_coding_agent.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_coding_agent(mut self, entry: RegistryEntry) -> Self {
        self.coding_agents.insert(entry.id.clone(), entry);
        self
    }

    #[must_use]
    pub fn with_dependency(mut self, entry: RegistryEntry) -> Self {
        self.dependencies.insert(entry.id.clone(), entry);
        self
    }

    #[must_use]
    pub fn with_plugin(mut self, entry: RegistryEntry) -> Self {
        self.plugins.insert(entry.id.clone(), entry);
        self
    }

    #[must_use]
    pub fn with_model_provider(mut self, provider: ModelProvider) -> Self {
        self.model_providers.insert(provider.id.clone(), provider);
        self
    }

    /// Add a secret every fleet needs regardless of its agents.
    #[must_use]
    pub fn with_infrastructure(mut self, spec: SecretSpec) -> Self {
        self.infrastructure.push(spec);
        self
    }

    /// Add a secret only fleets on `cloud` need.
    #[must_use]
    pub fn with_cloud_secret(mut self, cloud: CloudProvider, spec: SecretSpec) -> Self {
        self.cloud.entry(cloud).or_default().push(spec);
        self
    }

    pub fn coding_agent(&self, id: &str) -> Integration<'_> {
        Self::lookup(&self.coding_agents, RegistryKind::CodingAgent, id)
    }

    pub fn dependency(&self, id: &str) -> Integration<'_> {
        Self::lookup(&self.dependencies, RegistryKind::Dependency, id)
    }

    pub fn plugin(&self, id: &str) -> Integration<'_> {
        Self::lookup(&self.plugins, RegistryKind::Plugin, id)
    }

    fn lookup<'a>(
        table: &'a BTreeMap<String, RegistryEntry>,
        kind: RegistryKind,
        id: &str,
    ) -> Integration<'a> {
        table.get(id).map_or_else(
            || Integration::Unknown {
                kind,
                id: id.to_string(),
            },
            Integration::Known,
        )
    }

    #[must_use]
    pub fn model_provider(&self, id: &str) -> Option<&ModelProvider> {
        self.model_providers.get(id)
    }

    #[must_use]
    pub fn default_model_provider(&self) -> &str {
        &self.default_model_provider
    }

    #[must_use]
    pub fn default_coding_agent(&self) -> &str {
        &self.default_coding_agent
    }

    /// Always-global secrets for a fleet on `cloud`, base model credential
    /// included.
    #[must_use]
    pub fn infrastructure(&self, cloud: CloudProvider) -> Vec<&SecretSpec> {
        let mut specs: Vec<&SecretSpec> = self.infrastructure.iter().collect();
        if let Some(provider) = self.model_providers.get(&self.default_model_provider) {
            specs.push(&provider.credential);
        }
        if let Some(cloud_specs) = self.cloud.get(&cloud) {
            specs.extend(cloud_specs);
        }
        specs
    }

    /// Every env var any table could place in the global set, mapped to its
    /// store key. Used to prune keys a previous run wrote.
    #[must_use]
    pub fn managed_global_keys(&self) -> BTreeMap<String, String> {
        let entries = self
            .coding_agents
            .values()
            .chain(self.dependencies.values())
            .chain(self.plugins.values());
        let provider_scoped = entries
            .flat_map(|entry| entry.secrets.iter())
            .filter(|spec| spec.scope == SecretScope::Provider);

        self.infrastructure
            .iter()
            .chain(self.cloud.values().flatten())
            .chain(self.model_providers.values().map(|p| &p.credential))
            .chain(provider_scoped)
            .map(|spec| (spec.env_var.clone(), spec.global_store_key()))
            .collect()
    }
}

/// Provider part of a model identifier such as `openai/gpt-5`.
///
/// A bare model name belongs to `default`.
#[must_use]
pub fn model_provider_of<'a>(model: &'a str, default: &'a str) -> &'a str {
    model
        .split_once('/')
        .map_or(default, |(provider, _)| provider)
}
