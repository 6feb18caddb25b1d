//! Project fixtures: a temp directory with `armada.yaml`, identities and
//! `.env`, plus the registries the service tests run against.

#![allow(clippy::expect_used, dead_code)]

use std::fmt::Write as _;
use std::path::PathBuf;

use armada_cli::application::services::fleet_plan::{FleetPlan, plan_fleet};
use armada_cli::domain::registry::{
    ModelProvider, Registries, RegistryEntry, SecretSpec, Validator,
};
use armada_cli::infra::fs::LocalFs;
use tempfile::TempDir;

use crate::mocks::{FakeGit, RecordingReporter};

pub const LINEAR_API_KEY: &str = "lin_api_0123456789abcdef";
pub const ANTHROPIC_KEY: &str = "sk-ant-api03-test";
pub const HOOK_SCRIPT: &str = "linear-resolve-user";

/// Builds the text of an `identity.yaml`.
pub struct IdentityYaml {
    role: String,
    plugins: Vec<String>,
    deps: Vec<String>,
    required_secrets: Vec<String>,
    template_vars: Vec<String>,
}

impl IdentityYaml {
    pub fn new(role: &str) -> Self {
        Self {
            role: role.to_string(),
            plugins: Vec::new(),
            deps: Vec::new(),
            required_secrets: Vec::new(),
            template_vars: Vec::new(),
        }
    }

    pub fn plugin(mut self, id: &str) -> Self {
        self.plugins.push(id.to_string());
        self
    }

    pub fn dep(mut self, id: &str) -> Self {
        self.deps.push(id.to_string());
        self
    }

    pub fn required_secret(mut self, env_var: &str) -> Self {
        self.required_secrets.push(env_var.to_string());
        self
    }

    pub fn template_var(mut self, name: &str) -> Self {
        self.template_vars.push(name.to_string());
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "name: {role}\ndisplayName: {role}\nrole: {role}\nemoji: \"🤖\"\n\
description: The {role} agent\nvolumeSize: 20\nskills: []\n",
            role = self.role
        );
        for (field, items) in [
            ("plugins", &self.plugins),
            ("deps", &self.deps),
            ("requiredSecrets", &self.required_secrets),
        ] {
            if !items.is_empty() {
                let _ = writeln!(out, "{field}: [{}]", items.join(", "));
            }
        }
        let _ = writeln!(out, "templateVars: [{}]", self.template_vars.join(", "));
        out
    }
}

/// One agent line of a fleet manifest.
pub struct AgentYaml {
    pub role: String,
    pub identity: String,
    pub extra: String,
}

impl AgentYaml {
    /// An agent whose identity lives at `./identities/<role>`.
    pub fn local(role: &str) -> Self {
        Self {
            role: role.to_string(),
            identity: format!("./identities/{role}"),
            extra: String::new(),
        }
    }

    /// Appends raw YAML lines (already indented by four spaces).
    pub fn with(mut self, yaml: &str) -> Self {
        self.extra.push_str(yaml);
        self
    }
}

pub fn fleet_yaml(stack: &str, agents: &[AgentYaml]) -> String {
    let mut out = format!(
        "stackName: {stack}\nprovider: aws\nregion: us-east-1\ninstanceType: t3.medium\nagents:\n"
    );
    for agent in agents {
        let _ = write!(
            out,
            "  - name: agent-{role}\n    displayName: {role}\n    role: {role}\n    identity: {identity}\n{extra}",
            role = agent.role,
            identity = agent.identity,
            extra = agent.extra,
        );
    }
    out
}

/// A project laid out in a temp directory.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn cache(&self) -> PathBuf {
        self.dir.path().join(".cache").join("identities")
    }

    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(path, content).expect("write");
        self
    }

    pub fn fleet(&self, yaml: &str) -> &Self {
        self.write("armada.yaml", yaml)
    }

    pub fn identity(&self, identity: &IdentityYaml) -> &Self {
        self.write(
            &format!("identities/{}/identity.yaml", identity.role),
            &identity.render(),
        )
    }

    pub fn env(&self, content: &str) -> &Self {
        self.write(".env", content)
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(rel)).expect("read")
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }
}

// ── Registries ────────────────────────────────────────────────────────────────

fn linear(webhook_auto: bool) -> RegistryEntry {
    let webhook = SecretSpec::secret("webhookSecret", "LINEAR_WEBHOOK_SECRET", Validator::NonEmpty);
    let webhook = if webhook_auto {
        webhook.auto_resolvable()
    } else {
        webhook
    };
    let entry = RegistryEntry::new("linear", "Linear")
        .with_secret(SecretSpec::secret("apiKey", "LINEAR_API_KEY", Validator::LinearApiKey))
        .with_secret(webhook);
    if webhook_auto {
        entry.with_resolve_hook(HOOK_SCRIPT)
    } else {
        entry
    }
}

fn base() -> Registries {
    Registries::empty("anthropic", "claude-code")
        .with_coding_agent(RegistryEntry::new("claude-code", "Claude Code"))
}

/// Only Linear, with both secrets supplied by the operator.
pub fn linear_registries() -> Registries {
    base().with_plugin(linear(false))
}

/// Linear with an auto-resolvable webhook secret and a resolve hook.
pub fn linear_hook_registries() -> Registries {
    base().with_plugin(linear(true))
}

/// Anthropic as the default model provider plus a provider-scoped search
/// dependency, for global-value and pruning scenarios.
pub fn global_registries() -> Registries {
    base()
        .with_model_provider(ModelProvider {
            id: "anthropic".to_string(),
            display_name: "Anthropic".to_string(),
            credential: SecretSpec::secret("apiKey", "ANTHROPIC_API_KEY", Validator::AnthropicKey)
                .provider_scoped(),
        })
        .with_dependency(RegistryEntry::new("brave-search", "Brave Search").with_secret(
            SecretSpec::secret("apiKey", "BRAVE_API_KEY", Validator::NonEmpty).provider_scoped(),
        ))
}

/// pm uses Linear; eng uses nothing.
pub fn pm_eng_project() -> Project {
    let project = Project::new();
    project
        .fleet(&fleet_yaml(
            "dev",
            &[AgentYaml::local("pm"), AgentYaml::local("eng")],
        ))
        .identity(&IdentityYaml::new("pm").plugin("linear"))
        .identity(&IdentityYaml::new("eng"));
    project
}

/// Plans `project`'s fleet against `registries` with local identities only.
pub async fn plan(project: &Project, registries: &Registries) -> FleetPlan {
    plan_fleet(
        &FakeGit::new(),
        &LocalFs,
        &RecordingReporter::new(),
        registries,
        &project.root(),
        &project.cache(),
    )
    .await
    .expect("fleet plan")
}
