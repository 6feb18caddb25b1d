//! Tests for the secret resolution pipeline.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeMap;

use armada_cli::application::services::fleet_plan::{FleetPlan, load_secret_source};
use armada_cli::application::services::secret_resolution::{
    Resolution, ResolutionInput, resolve_secrets,
};
use armada_cli::domain::error::SecretError;
use armada_cli::domain::registry::Registries;
use armada_cli::infra::fs::LocalFs;

use crate::helpers::{
    AgentYaml, IdentityYaml, LINEAR_API_KEY, Project, fleet_yaml, linear_hook_registries,
    linear_registries, plan, pm_eng_project,
};
use crate::mocks::{FakeHooks, RecordingReporter};

async fn resolve(
    project: &Project,
    plan: &FleetPlan,
    registries: &Registries,
    hooks: &FakeHooks,
    ambient: &BTreeMap<String, String>,
) -> anyhow::Result<Resolution> {
    let source = load_secret_source(&LocalFs, &project.root()).expect(".env");
    resolve_secrets(
        hooks,
        &LocalFs,
        &RecordingReporter::new(),
        registries,
        &project.root(),
        ResolutionInput {
            fleet: &plan.fleet,
            schema: &plan.schema,
            source: &source,
            ambient,
            previous: &BTreeMap::new(),
        },
    )
    .await
}

fn missing_keys(err: &anyhow::Error) -> Vec<String> {
    let Some(SecretError::MissingSecrets(missing)) = err.downcast_ref::<SecretError>() else {
        panic!("expected MissingSecrets, got {err:#}");
    };
    missing.iter().map(|m| m.source_key.clone()).collect()
}

// ── Merge and missing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_resolve_reports_only_the_missing_agent_secret() {
    let project = pm_eng_project();
    project.env(&format!("PM_LINEAR_API_KEY={LINEAR_API_KEY}\n"));
    let registries = linear_registries();
    let plan = plan(&project, &registries).await;

    let err = resolve(&project, &plan, &registries, &FakeHooks::unused(), &BTreeMap::new())
        .await
        .expect_err("webhook secret is missing");

    assert_eq!(missing_keys(&err), ["PM_LINEAR_WEBHOOK_SECRET"]);
    assert!(format!("{err:#}").contains("PM_LINEAR_WEBHOOK_SECRET (agent pm)"));
}

#[tokio::test]
async fn test_resolve_writes_env_example_even_on_failure() {
    let project = pm_eng_project();
    let registries = linear_registries();
    let plan = plan(&project, &registries).await;

    let _ = resolve(&project, &plan, &registries, &FakeHooks::unused(), &BTreeMap::new()).await;

    let example = project.read(".env.example");
    assert!(example.contains("\nPM_LINEAR_API_KEY=\n"));
    assert!(example.contains("\nPM_LINEAR_WEBHOOK_SECRET=\n"));
    assert!(example.contains("# ── Agent eng (agent-eng, role eng) ──"));
    assert!(example.contains("# (no per-agent secrets)"));
}

#[tokio::test]
async fn test_resolve_blank_value_counts_as_missing() {
    let project = pm_eng_project();
    project.env(&format!(
        "PM_LINEAR_API_KEY={LINEAR_API_KEY}\nPM_LINEAR_WEBHOOK_SECRET=   \n"
    ));
    let registries = linear_registries();
    let plan = plan(&project, &registries).await;

    let err = resolve(&project, &plan, &registries, &FakeHooks::unused(), &BTreeMap::new())
        .await
        .expect_err("blank is missing");

    assert_eq!(missing_keys(&err), ["PM_LINEAR_WEBHOOK_SECRET"]);
}

#[tokio::test]
async fn test_resolve_invalid_format_is_a_warning_only() {
    let project = pm_eng_project();
    project.env("PM_LINEAR_API_KEY=not-a-linear-key\nPM_LINEAR_WEBHOOK_SECRET=whsec\n");
    let registries = linear_registries();
    let plan = plan(&project, &registries).await;

    let resolution = resolve(&project, &plan, &registries, &FakeHooks::unused(), &BTreeMap::new())
        .await
        .expect("format problems do not block");

    assert_eq!(resolution.warnings.len(), 1);
    assert_eq!(resolution.warnings[0].source_key, "PM_LINEAR_API_KEY");
    assert_eq!(
        resolution.resolved.per_agent["pm"]["LINEAR_API_KEY"],
        "not-a-linear-key"
    );
}

// ── Auto-resolve ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_resolve_hook_fills_auto_resolvable_value() {
    let project = pm_eng_project();
    project.env(&format!("PM_LINEAR_API_KEY={LINEAR_API_KEY}\n"));
    let registries = linear_hook_registries();
    let plan = plan(&project, &registries).await;
    let hooks = FakeHooks::resolving(&[("LINEAR_WEBHOOK_SECRET", "whsec-from-hook")]);

    let resolution = resolve(&project, &plan, &registries, &hooks, &BTreeMap::new())
        .await
        .expect("hook resolves the webhook secret");

    assert_eq!(hooks.calls(), 1);
    assert_eq!(
        hooks.envs.borrow()[0].get("LINEAR_API_KEY").map(String::as_str),
        Some(LINEAR_API_KEY)
    );
    assert_eq!(resolution.auto_resolved, ["PM_LINEAR_WEBHOOK_SECRET"]);
    assert_eq!(
        resolution.resolved.per_agent["pm"]["LINEAR_WEBHOOK_SECRET"],
        "whsec-from-hook"
    );
}

#[tokio::test]
async fn test_resolve_hook_failure_names_override() {
    let project = pm_eng_project();
    project.env(&format!("PM_LINEAR_API_KEY={LINEAR_API_KEY}\n"));
    let registries = linear_hook_registries();
    let plan = plan(&project, &registries).await;

    let err = resolve(
        &project,
        &plan,
        &registries,
        &FakeHooks::failing("401 Unauthorized"),
        &BTreeMap::new(),
    )
    .await
    .expect_err("hook failure is fatal");

    let Some(SecretError::HookResolutionFailure {
        plugin,
        agent,
        reason,
        override_var,
    }) = err.downcast_ref::<SecretError>()
    else {
        panic!("expected HookResolutionFailure, got {err:#}");
    };
    assert_eq!(plugin, "linear");
    assert_eq!(agent, "pm");
    assert_eq!(reason, "401 Unauthorized");
    assert_eq!(override_var, "PM_LINEAR_WEBHOOK_SECRET");
}

#[tokio::test]
async fn test_resolve_hook_without_value_leaves_key_missing() {
    let project = pm_eng_project();
    project.env(&format!("PM_LINEAR_API_KEY={LINEAR_API_KEY}\n"));
    let registries = linear_hook_registries();
    let plan = plan(&project, &registries).await;
    let hooks = FakeHooks::resolving(&[("UNRELATED", "x")]);

    let err = resolve(&project, &plan, &registries, &hooks, &BTreeMap::new())
        .await
        .expect_err("hook produced nothing useful");

    assert_eq!(hooks.calls(), 1);
    assert_eq!(missing_keys(&err), ["PM_LINEAR_WEBHOOK_SECRET"]);
}

#[tokio::test]
async fn test_resolve_ambient_override_skips_hook() {
    let project = pm_eng_project();
    project.env(&format!("PM_LINEAR_API_KEY={LINEAR_API_KEY}\n"));
    let registries = linear_hook_registries();
    let plan = plan(&project, &registries).await;
    let ambient = BTreeMap::from([(
        "PM_LINEAR_WEBHOOK_SECRET".to_string(),
        "whsec-from-env".to_string(),
    )]);
    let hooks = FakeHooks::unused();

    let resolution = resolve(&project, &plan, &registries, &hooks, &ambient)
        .await
        .expect("environment override");

    assert_eq!(hooks.calls(), 0);
    assert_eq!(
        resolution.resolved.per_agent["pm"]["LINEAR_WEBHOOK_SECRET"],
        "whsec-from-env"
    );
}

#[tokio::test]
async fn test_resolve_plugin_config_skips_hook() {
    let project = Project::new();
    project
        .fleet(&fleet_yaml(
            "dev",
            &[AgentYaml::local("pm")
                .with("    plugins:\n      linear:\n        webhookSecret: whsec-configured\n")],
        ))
        .identity(&IdentityYaml::new("pm").plugin("linear"))
        .env(&format!("PM_LINEAR_API_KEY={LINEAR_API_KEY}\n"));
    let registries = linear_hook_registries();
    let plan = plan(&project, &registries).await;
    let hooks = FakeHooks::unused();

    let resolution = resolve(&project, &plan, &registries, &hooks, &BTreeMap::new())
        .await
        .expect("plugin config");

    assert_eq!(hooks.calls(), 0);
    assert_eq!(
        resolution.resolved.per_agent["pm"]["LINEAR_WEBHOOK_SECRET"],
        "whsec-configured"
    );
}

#[tokio::test]
async fn test_resolve_hook_runs_per_agent_with_its_own_values() {
    let project = Project::new();
    project
        .fleet(&fleet_yaml(
            "dev",
            &[AgentYaml::local("pm"), AgentYaml::local("ops")],
        ))
        .identity(&IdentityYaml::new("pm").plugin("linear"))
        .identity(&IdentityYaml::new("ops").plugin("linear"))
        .env("PM_LINEAR_API_KEY=lin_api_pm\nOPS_LINEAR_API_KEY=lin_api_ops\n");
    let registries = linear_hook_registries();
    let plan = plan(&project, &registries).await;
    let hooks = FakeHooks::resolving(&[("LINEAR_WEBHOOK_SECRET", "whsec")]);

    resolve(&project, &plan, &registries, &hooks, &BTreeMap::new())
        .await
        .expect("both agents resolved");

    let envs = hooks.envs.borrow();
    assert_eq!(envs.len(), 2);
    assert_eq!(envs[0]["LINEAR_API_KEY"], "lin_api_pm");
    assert_eq!(envs[1]["LINEAR_API_KEY"], "lin_api_ops");
}

#[tokio::test]
async fn test_resolve_identity_required_secret_is_per_agent() {
    let project = Project::new();
    project
        .fleet(&fleet_yaml("dev", &[AgentYaml::local("eng-lead")]))
        .identity(&IdentityYaml::new("eng-lead").required_secret("SENTRY_DSN"));
    let registries = linear_registries();
    let plan = plan(&project, &registries).await;

    let err = resolve(&project, &plan, &registries, &FakeHooks::unused(), &BTreeMap::new())
        .await
        .expect_err("SENTRY_DSN is missing");

    assert_eq!(missing_keys(&err), ["ENG_LEAD_SENTRY_DSN"]);
}

#[tokio::test]
async fn test_resolve_hook_runner_error_names_override() {
    let project = pm_eng_project();
    project.env(&format!("PM_LINEAR_API_KEY={LINEAR_API_KEY}\n"));
    let registries = linear_hook_registries();
    let plan = plan(&project, &registries).await;
    let hooks = FakeHooks::erroring("failed to spawn sh: No such file or directory");

    let err = resolve(&project, &plan, &registries, &hooks, &BTreeMap::new())
        .await
        .expect_err("runner error is a hook failure");

    let Some(SecretError::HookResolutionFailure {
        reason,
        override_var,
        ..
    }) = err.downcast_ref::<SecretError>()
    else {
        panic!("expected HookResolutionFailure, got {err:#}");
    };
    assert!(reason.contains("failed to spawn sh"), "{reason}");
    assert_eq!(override_var, "PM_LINEAR_WEBHOOK_SECRET");
}

// ── Built-in registries ───────────────────────────────────────────────────────

const INFRA_ENV: &str = "\
TAILSCALE_AUTH_KEY=tskey-auth-abc123
TAILNET_DNS_NAME=fleet.ts.net
ANTHROPIC_API_KEY=sk-ant-api03-xyz
";

const USER_UUID: &str = "6f1c2a9e-1b2c-4d3e-8f90-0123456789ab";

#[tokio::test]
async fn test_builtin_missing_values_reported_together_before_any_hook() {
    let project = pm_eng_project();
    project.env(&format!("{INFRA_ENV}PM_LINEAR_API_KEY={LINEAR_API_KEY}\n"));
    let registries = Registries::builtin();
    let plan = plan(&project, &registries).await;
    let hooks = FakeHooks::failing("Linear API request failed");

    let err = resolve(&project, &plan, &registries, &hooks, &BTreeMap::new())
        .await
        .expect_err("webhook secret is missing");

    assert_eq!(hooks.calls(), 0);
    let mut missing = missing_keys(&err);
    missing.sort();
    assert_eq!(missing, ["PM_LINEAR_USER_UUID", "PM_LINEAR_WEBHOOK_SECRET"]);
}

#[tokio::test]
async fn test_builtin_hook_fills_user_uuid_once_inputs_are_present() {
    let project = pm_eng_project();
    project.env(&format!(
        "{INFRA_ENV}PM_LINEAR_API_KEY={LINEAR_API_KEY}\nPM_LINEAR_WEBHOOK_SECRET=whsec\n"
    ));
    let registries = Registries::builtin();
    let plan = plan(&project, &registries).await;
    let hooks = FakeHooks::resolving(&[("LINEAR_USER_UUID", USER_UUID)]);

    let resolution = resolve(&project, &plan, &registries, &hooks, &BTreeMap::new())
        .await
        .expect("complete");

    assert_eq!(hooks.calls(), 1);
    assert_eq!(resolution.auto_resolved, ["PM_LINEAR_USER_UUID"]);
    assert_eq!(
        resolution.resolved.per_agent["pm"]["LINEAR_USER_UUID"],
        USER_UUID
    );
    assert!(
        resolution
            .warnings
            .iter()
            .all(|w| w.source_key != "PM_LINEAR_USER_UUID")
    );
}

#[tokio::test]
async fn test_builtin_hook_value_is_format_checked() {
    let project = pm_eng_project();
    project.env(&format!(
        "{INFRA_ENV}PM_LINEAR_API_KEY={LINEAR_API_KEY}\nPM_LINEAR_WEBHOOK_SECRET=whsec\n"
    ));
    let registries = Registries::builtin();
    let plan = plan(&project, &registries).await;
    let hooks = FakeHooks::resolving(&[("LINEAR_USER_UUID", "not-a-uuid")]);
    let reporter = RecordingReporter::new();
    let source = load_secret_source(&LocalFs, &project.root()).expect(".env");

    let resolution = resolve_secrets(
        &hooks,
        &LocalFs,
        &reporter,
        &registries,
        &project.root(),
        ResolutionInput {
            fleet: &plan.fleet,
            schema: &plan.schema,
            source: &source,
            ambient: &BTreeMap::new(),
            previous: &BTreeMap::new(),
        },
    )
    .await
    .expect("format problems do not block");

    assert!(
        resolution
            .warnings
            .iter()
            .any(|w| w.source_key == "PM_LINEAR_USER_UUID")
    );
    assert!(
        reporter
            .warnings()
            .iter()
            .any(|w| w.starts_with("PM_LINEAR_USER_UUID:"))
    );
}
