//! Format validators for secret values.
//!
//! Validators are heuristics. A failed check is reported as a warning and
//! never blocks resolution.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid regex")
});

static HCLOUD_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9]{64}$").expect("valid regex")
});

/// Closed set of value validators a registry entry can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Validator {
    NonEmpty,
    AnthropicKey,
    OpenAiKey,
    OpenRouterKey,
    GoogleKey,
    TailscaleAuthKey,
    TailnetDnsName,
    HcloudToken,
    LinearApiKey,
    SlackBotToken,
    SlackAppToken,
    GithubToken,
    Uuid,
}

impl Validator {
    /// Check `value`, returning a human-readable reason on failure.
    ///
    /// # Errors
    ///
    /// Returns the expected format when the value does not match.
    pub fn check(self, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err("value is empty".to_string());
        }
        let ok = match self {
            Self::NonEmpty => true,
            Self::AnthropicKey => value.starts_with("sk-ant-"),
            Self::OpenAiKey => value.starts_with("sk-"),
            Self::OpenRouterKey => value.starts_with("sk-or-"),
            Self::GoogleKey => value.starts_with("AIza"),
            Self::TailscaleAuthKey => value.starts_with("tskey-auth-"),
            Self::TailnetDnsName => value.ends_with(".ts.net"),
            Self::HcloudToken => HCLOUD_TOKEN_RE.is_match(value),
            Self::LinearApiKey => value.starts_with("lin_api_"),
            Self::SlackBotToken => value.starts_with("xoxb-"),
            Self::SlackAppToken => value.starts_with("xapp-"),
            Self::GithubToken => ["ghp_", "github_pat_", "gho_", "ghs_"]
                .iter()
                .any(|prefix| value.starts_with(prefix)),
            Self::Uuid => UUID_RE.is_match(value),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("expected {}", self.hint()))
        }
    }

    /// Stable tag, as serialized.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NonEmpty => "non-empty",
            Self::AnthropicKey => "anthropic-key",
            Self::OpenAiKey => "open-ai-key",
            Self::OpenRouterKey => "open-router-key",
            Self::GoogleKey => "google-key",
            Self::TailscaleAuthKey => "tailscale-auth-key",
            Self::TailnetDnsName => "tailnet-dns-name",
            Self::HcloudToken => "hcloud-token",
            Self::LinearApiKey => "linear-api-key",
            Self::SlackBotToken => "slack-bot-token",
            Self::SlackAppToken => "slack-app-token",
            Self::GithubToken => "github-token",
            Self::Uuid => "uuid",
        }
    }

    /// Short description of the expected format.
    #[must_use]
    pub fn hint(self) -> &'static str {
        match self {
            Self::NonEmpty => "a non-empty value",
            Self::AnthropicKey => "an Anthropic key starting with sk-ant-",
            Self::OpenAiKey => "an OpenAI key starting with sk-",
            Self::OpenRouterKey => "an OpenRouter key starting with sk-or-",
            Self::GoogleKey => "a Google AI key starting with AIza",
            Self::TailscaleAuthKey => "a Tailscale auth key starting with tskey-auth-",
            Self::TailnetDnsName => "a tailnet DNS name ending in .ts.net",
            Self::HcloudToken => "a 64-character Hetzner Cloud API token",
            Self::LinearApiKey => "a Linear API key starting with lin_api_",
            Self::SlackBotToken => "a Slack bot token starting with xoxb-",
            Self::SlackAppToken => "a Slack app-level token starting with xapp-",
            Self::GithubToken => "a GitHub token starting with ghp_ or github_pat_",
            Self::Uuid => "a UUID",
        }
    }
}
