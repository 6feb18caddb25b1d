//! Secret schema builder.
//!
//! Turns every agent's identity plus the registries into one non-redundant
//! set of requirements, split into fleet-global and per-agent scopes.
//! Pure: no I/O, no async.

use std::collections::BTreeMap;
use std::fmt;

use armada_common::{CloudProvider, FleetAgent, IdentityManifest};
use serde::Serialize;

use crate::domain::error::SchemaError;
use crate::domain::registry::{
    Integration, Registries, SecretScope, SecretSpec, Validator, model_provider_of,
};
use crate::domain::stack::{agent_source_key, agent_store_key};

/// What introduced a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "kebab-case")]
pub enum Provenance {
    Infrastructure,
    ModelProvider(String),
    CodingAgent(String),
    Dependency(String),
    Plugin(String),
    Identity,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infrastructure => f.write_str("infrastructure"),
            Self::ModelProvider(id) => write!(f, "model provider {id}"),
            Self::CodingAgent(id) => write!(f, "coding agent {id}"),
            Self::Dependency(id) => write!(f, "dependency {id}"),
            Self::Plugin(id) => write!(f, "plugin {id}"),
            Self::Identity => f.write_str("identity"),
        }
    }
}

/// Who a requirement belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "role", rename_all = "lowercase")]
pub enum RequirementScope {
    Global,
    Agent(String),
}

/// One value that must exist before provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRequirement {
    pub scope: RequirementScope,
    /// Registry-local key, also the key inside an agent's plugin config.
    pub key: String,
    pub env_var: String,
    /// Key the operator sets in `.env`.
    pub source_key: String,
    /// Key the value is written under in the stack.
    pub store_key: String,
    pub is_secret: bool,
    pub auto_resolvable: bool,
    pub validator: Validator,
    pub sources: Vec<Provenance>,
}

impl SecretRequirement {
    fn from_spec(spec: &SecretSpec, scope: RequirementScope, source: Provenance) -> Self {
        let (source_key, store_key) = match &scope {
            RequirementScope::Global => (spec.env_var.clone(), spec.global_store_key()),
            RequirementScope::Agent(role) => (
                agent_source_key(role, &spec.env_var),
                agent_store_key(role, &spec.env_var),
            ),
        };
        Self {
            scope,
            key: spec.key.clone(),
            env_var: spec.env_var.clone(),
            source_key,
            store_key,
            is_secret: spec.is_secret,
            auto_resolvable: spec.auto_resolvable,
            validator: spec.validator,
            sources: vec![source],
        }
    }

    /// Role of the owning agent, `None` for global requirements.
    #[must_use]
    pub fn agent(&self) -> Option<&str> {
        match &self.scope {
            RequirementScope::Global => None,
            RequirementScope::Agent(role) => Some(role),
        }
    }

    /// Plugin that declared this requirement, if any.
    #[must_use]
    pub fn plugin(&self) -> Option<&str> {
        self.sources.iter().find_map(|s| match s {
            Provenance::Plugin(id) => Some(id.as_str()),
            _ => None,
        })
    }

    fn add_source(&mut self, source: Provenance) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }
}

/// An agent paired with its fetched identity.
#[derive(Debug, Clone, Copy)]
pub struct AgentBinding<'a> {
    pub agent: &'a FleetAgent,
    pub identity: &'a IdentityManifest,
}

/// Per-agent requirements, in fleet order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequirements {
    pub role: String,
    pub name: String,
    pub display_name: String,
    pub requirements: Vec<SecretRequirement>,
}

/// Output of [`build_schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSchema {
    pub global: Vec<SecretRequirement>,
    pub agents: Vec<AgentRequirements>,
    /// Env var → store key for every key the registries could place in the
    /// global set.
    pub managed_global_keys: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SecretSchema {
    #[must_use]
    pub fn global_requirement(&self, env_var: &str) -> Option<&SecretRequirement> {
        self.global.iter().find(|r| r.env_var == env_var)
    }

    #[must_use]
    pub fn agent(&self, role: &str) -> Option<&AgentRequirements> {
        self.agents.iter().find(|a| a.role == role)
    }

    /// Every requirement, global first, then agents in fleet order.
    pub fn all(&self) -> impl Iterator<Item = &SecretRequirement> {
        self.global
            .iter()
            .chain(self.agents.iter().flat_map(|a| a.requirements.iter()))
    }
}

/// Tracks the first declaration of each env var to catch disagreements.
#[derive(Default)]
struct Classifications {
    seen: BTreeMap<String, (Validator, bool, SecretScope, Provenance)>,
    conflicts: Vec<String>,
}

impl Classifications {
    fn check(&mut self, spec: &SecretSpec, source: &Provenance) {
        let (validator, is_secret, scope) = spec.classification();
        match self.seen.get(&spec.env_var) {
            None => {
                self.seen.insert(
                    spec.env_var.clone(),
                    (validator, is_secret, scope, source.clone()),
                );
            }
            Some((v, s, sc, first)) if (*v, *s, *sc) != (validator, is_secret, scope) => {
                let conflict = format!(
                    "{}: {first} declares {} but {source} declares {}",
                    spec.env_var,
                    describe(*v, *s, *sc),
                    describe(validator, is_secret, scope),
                );
                if !self.conflicts.contains(&conflict) {
                    self.conflicts.push(conflict);
                }
            }
            Some(_) => {}
        }
    }
}

fn describe(validator: Validator, is_secret: bool, scope: SecretScope) -> String {
    let class = if is_secret { "secret" } else { "plaintext" };
    let scope = match scope {
        SecretScope::Agent => "agent",
        SecretScope::Provider => "provider",
    };
    format!("({}, {class}, {scope})", validator.name())
}

fn upsert(
    set: &mut Vec<SecretRequirement>,
    spec: &SecretSpec,
    scope: &RequirementScope,
    source: Provenance,
) {
    if let Some(existing) = set.iter_mut().find(|r| r.env_var == spec.env_var) {
        existing.add_source(source);
    } else {
        set.push(SecretRequirement::from_spec(spec, scope.clone(), source));
    }
}

/// Computes the global and per-agent requirements of a fleet.
///
/// Provider-scoped secrets from any agent are lifted into the global set once.
/// Unknown plugin, dependency, coding-agent or model-provider ids become
/// warnings.
///
/// # Errors
///
/// `SchemaError::Conflict` when two declarations of the same env var disagree
/// on validator, classification or scope.
pub fn build_schema(
    cloud: CloudProvider,
    bindings: &[AgentBinding<'_>],
    registries: &Registries,
) -> Result<SecretSchema, SchemaError> {
    let mut classes = Classifications::default();
    let mut global: Vec<SecretRequirement> = Vec::new();
    let mut warnings = Vec::new();

    for spec in registries.infrastructure(cloud) {
        classes.check(spec, &Provenance::Infrastructure);
        upsert(&mut global, spec, &RequirementScope::Global, Provenance::Infrastructure);
    }

    let mut agents = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let role = binding.agent.role.as_str();
        let scope = RequirementScope::Agent(role.to_string());
        let mut own: Vec<SecretRequirement> = Vec::new();

        let mut add = |spec: &SecretSpec, source: Provenance, global: &mut Vec<SecretRequirement>| {
            classes.check(spec, &source);
            match spec.scope {
                SecretScope::Provider => upsert(global, spec, &RequirementScope::Global, source),
                SecretScope::Agent => upsert(&mut own, spec, &scope, source),
            }
        };

        let identity = binding.identity;
        let coding_agent = identity
            .coding_agent
            .as_deref()
            .unwrap_or_else(|| registries.default_coding_agent());

        let integrations = std::iter::once((
            registries.coding_agent(coding_agent),
            Provenance::CodingAgent as fn(String) -> Provenance,
        ))
        .chain(
            identity.deps.iter().map(|id| {
                (
                    registries.dependency(id),
                    Provenance::Dependency as fn(String) -> Provenance,
                )
            }),
        )
        .chain(
            identity
                .plugins
                .iter()
                .map(|id| (registries.plugin(id), Provenance::Plugin as fn(String) -> Provenance)),
        );

        for (integration, provenance) in integrations {
            match integration {
                Integration::Known(entry) => {
                    for spec in &entry.secrets {
                        add(spec, provenance(entry.id.clone()), &mut global);
                    }
                }
                unknown @ Integration::Unknown { .. } => {
                    if let Some(w) = unknown.warning(role) {
                        warnings.push(w);
                    }
                }
            }
        }

        let default_provider = registries.default_model_provider();
        for model in [&identity.model, &identity.backup_model].into_iter().flatten() {
            let provider = model_provider_of(model, default_provider);
            if provider == default_provider {
                continue;
            }
            match registries.model_provider(provider) {
                Some(p) => add(
                    &p.credential,
                    Provenance::ModelProvider(p.id.clone()),
                    &mut global,
                ),
                None => warnings.push(format!(
                    "agent '{role}' uses model '{model}' from unknown model provider '{provider}'; skipping its credential"
                )),
            }
        }

        for env_var in &identity.required_secrets {
            if let Some(req) = global.iter_mut().find(|r| &r.env_var == env_var) {
                req.add_source(Provenance::Identity);
            } else if let Some(req) = own.iter_mut().find(|r| &r.env_var == env_var) {
                req.add_source(Provenance::Identity);
            } else {
                let spec = SecretSpec::secret(env_var, env_var, Validator::NonEmpty);
                own.push(SecretRequirement::from_spec(&spec, scope.clone(), Provenance::Identity));
            }
        }

        agents.push(AgentRequirements {
            role: role.to_string(),
            name: binding.agent.name.clone(),
            display_name: binding.agent.display_name.clone(),
            requirements: own,
        });
    }

    if !classes.conflicts.is_empty() {
        return Err(SchemaError::Conflict(classes.conflicts));
    }

    Ok(SecretSchema {
        global,
        agents,
        managed_global_keys: registries.managed_global_keys(),
        warnings,
    })
}
