//! Built-in registry content.
//!
//! Each table is a sealed enum whose `entry()` is an exhaustive `match`, so a
//! new variant cannot ship without its secrets and install steps.

use armada_common::CloudProvider;

use super::{ModelProvider, RegistryEntry, Registries, SecretSpec, Validator};

pub const DEFAULT_MODEL_PROVIDER: &str = "anthropic";
pub const DEFAULT_CODING_AGENT: &str = "claude-code";

/// Looks up the Linear user id behind `LINEAR_API_KEY`.
const LINEAR_USER_UUID_HOOK: &str = r#"set -eu
: "${LINEAR_API_KEY:?LINEAR_API_KEY is required to look up the Linear user}"
resp=$(curl -fsS https://api.linear.app/graphql \
  -H "Authorization: ${LINEAR_API_KEY}" \
  -H "Content-Type: application/json" \
  -d '{"query":"{ viewer { id } }"}') || { echo "Linear API request failed" >&2; exit 1; }
id=$(printf '%s' "$resp" | sed -n 's/.*"viewer":{"id":"\([^"]*\)".*/\1/p')
[ -n "$id" ] || { echo "Linear API response did not contain a viewer id" >&2; exit 1; }
echo "LINEAR_USER_UUID=${id}"
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingAgentKind {
    ClaudeCode,
    Codex,
}

impl CodingAgentKind {
    pub const ALL: [Self; 2] = [Self::ClaudeCode, Self::Codex];

    #[must_use]
    pub fn entry(self) -> RegistryEntry {
        match self {
            Self::ClaudeCode => RegistryEntry::new("claude-code", "Claude Code")
                .with_secret(
                    SecretSpec::secret("apiKey", "ANTHROPIC_API_KEY", Validator::AnthropicKey)
                        .provider_scoped(),
                )
                .with_install("npm install -g @anthropic-ai/claude-code"),
            Self::Codex => RegistryEntry::new("codex", "Codex CLI")
                .with_secret(
                    SecretSpec::secret("apiKey", "OPENAI_API_KEY", Validator::OpenAiKey)
                        .provider_scoped(),
                )
                .with_install("npm install -g @openai/codex"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Gh,
    BraveSearch,
    Docker,
}

impl DependencyKind {
    pub const ALL: [Self; 3] = [Self::Gh, Self::BraveSearch, Self::Docker];

    #[must_use]
    pub fn entry(self) -> RegistryEntry {
        match self {
            Self::Gh => RegistryEntry::new("gh", "GitHub CLI")
                .with_secret(SecretSpec::secret(
                    "token",
                    "GITHUB_TOKEN",
                    Validator::GithubToken,
                ))
                .with_install("apt-get install -y gh")
                .with_post_install("printf '%s' \"$GITHUB_TOKEN\" | gh auth login --with-token"),
            Self::BraveSearch => RegistryEntry::new("brave-search", "Brave Search").with_secret(
                SecretSpec::secret("apiKey", "BRAVE_API_KEY", Validator::NonEmpty)
                    .provider_scoped(),
            ),
            Self::Docker => RegistryEntry::new("docker", "Docker Engine")
                .with_install("curl -fsSL https://get.docker.com | sh")
                .with_post_install("usermod -aG docker \"$AGENT_USER\""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Linear,
    Slack,
    Discord,
}

impl PluginKind {
    pub const ALL: [Self; 3] = [Self::Linear, Self::Slack, Self::Discord];

    #[must_use]
    pub fn entry(self) -> RegistryEntry {
        match self {
            Self::Linear => RegistryEntry::new("linear", "Linear")
                .with_secret(SecretSpec::secret(
                    "apiKey",
                    "LINEAR_API_KEY",
                    Validator::LinearApiKey,
                ))
                .with_secret(SecretSpec::secret(
                    "webhookSecret",
                    "LINEAR_WEBHOOK_SECRET",
                    Validator::NonEmpty,
                ))
                .with_secret(
                    SecretSpec::plaintext("userUuid", "LINEAR_USER_UUID", Validator::Uuid)
                        .auto_resolvable(),
                )
                .with_install("openclaw plugins install @openclaw/linear")
                .with_resolve_hook(LINEAR_USER_UUID_HOOK),
            Self::Slack => RegistryEntry::new("slack", "Slack")
                .with_secret(SecretSpec::secret(
                    "botToken",
                    "SLACK_BOT_TOKEN",
                    Validator::SlackBotToken,
                ))
                .with_secret(SecretSpec::secret(
                    "appToken",
                    "SLACK_APP_TOKEN",
                    Validator::SlackAppToken,
                ))
                .with_install("openclaw plugins install @openclaw/slack"),
            Self::Discord => RegistryEntry::new("discord", "Discord")
                .with_secret(SecretSpec::secret(
                    "botToken",
                    "DISCORD_BOT_TOKEN",
                    Validator::NonEmpty,
                ))
                .with_install("openclaw plugins install @openclaw/discord"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProviderKind {
    Anthropic,
    OpenAi,
    Google,
    OpenRouter,
}

impl ModelProviderKind {
    pub const ALL: [Self; 4] = [Self::Anthropic, Self::OpenAi, Self::Google, Self::OpenRouter];

    #[must_use]
    pub fn provider(self) -> ModelProvider {
        let (id, display_name, env_var, validator) = match self {
            Self::Anthropic => (
                "anthropic",
                "Anthropic",
                "ANTHROPIC_API_KEY",
                Validator::AnthropicKey,
            ),
            Self::OpenAi => ("openai", "OpenAI", "OPENAI_API_KEY", Validator::OpenAiKey),
            Self::Google => ("google", "Google AI", "GEMINI_API_KEY", Validator::GoogleKey),
            Self::OpenRouter => (
                "openrouter",
                "OpenRouter",
                "OPENROUTER_API_KEY",
                Validator::OpenRouterKey,
            ),
        };
        ModelProvider {
            id: id.to_string(),
            display_name: display_name.to_string(),
            credential: SecretSpec::secret("apiKey", env_var, validator).provider_scoped(),
        }
    }
}

impl Registries {
    /// The tables shipped with this build.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registries = Self::empty(DEFAULT_MODEL_PROVIDER, DEFAULT_CODING_AGENT)
            .with_infrastructure(
                SecretSpec::secret(
                    "tailscaleAuthKey",
                    "TAILSCALE_AUTH_KEY",
                    Validator::TailscaleAuthKey,
                )
                .provider_scoped(),
            )
            .with_infrastructure(
                SecretSpec::plaintext(
                    "tailnetDnsName",
                    "TAILNET_DNS_NAME",
                    Validator::TailnetDnsName,
                )
                .provider_scoped(),
            )
            .with_cloud_secret(
                CloudProvider::Hetzner,
                SecretSpec::secret("token", "HCLOUD_TOKEN", Validator::HcloudToken)
                    .provider_scoped()
                    .with_store_key("hcloud:token"),
            );

        for kind in CodingAgentKind::ALL {
            registries = registries.with_coding_agent(kind.entry());
        }
        for kind in DependencyKind::ALL {
            registries = registries.with_dependency(kind.entry());
        }
        for kind in PluginKind::ALL {
            registries = registries.with_plugin(kind.entry());
        }
        for kind in ModelProviderKind::ALL {
            registries = registries.with_model_provider(kind.provider());
        }
        registries
    }
}
