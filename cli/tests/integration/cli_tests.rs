//! Integration tests for the armada CLI
//!
//! Every test runs the real binary against a temp project with local
//! identities, so nothing touches the network or a real stack.

#![allow(clippy::expect_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn armada(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("armada"));
    cmd.env("NO_COLOR", "1")
        .env("HOME", home)
        .env("ARMADA_CONFIG", home.join("config.yaml"))
        .env_remove("ARMADA_PROJECT")
        .env_remove("ARMADA_LOG");
    cmd
}

const FLEET: &str = "\
stackName: dev
provider: aws
region: us-east-1
instanceType: t3.medium
agents:
  - name: agent-pm
    displayName: Juno
    role: pm
    identity: ./identities/pm
";

const IDENTITY: &str = "\
name: pm
displayName: Juno
role: pm
emoji: \"🧭\"
description: Plans the work
volumeSize: 20
skills: []
templateVars: []
";

const COMPLETE_ENV: &str = "\
TAILSCALE_AUTH_KEY=tskey-auth-abc123
TAILNET_DNS_NAME=fleet.ts.net
ANTHROPIC_API_KEY=sk-ant-api03-xyz
";

fn project() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("armada.yaml"), FLEET).expect("fleet");
    std::fs::create_dir_all(dir.path().join("identities/pm")).expect("mkdir");
    std::fs::write(dir.path().join("identities/pm/identity.yaml"), IDENTITY).expect("identity");
    dir
}

// --- Help and version ---

#[test]
fn test_cli_no_args_shows_help() {
    let home = TempDir::new().expect("tempdir");
    armada(home.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Resolve manifests and provision secrets",
        ));
}

#[test]
fn test_cli_help_lists_commands() {
    let home = TempDir::new().expect("tempdir");
    let output = armada(home.path()).arg("--help").output().expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    for command in ["schema", "validate", "provision", "fingerprint", "config"] {
        assert!(stdout.contains(command), "--help is missing {command}");
    }
}

#[test]
fn test_version_command_shows_version() {
    let home = TempDir::new().expect("tempdir");
    armada(home.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("armada 0.1.0"));
}

#[test]
fn test_version_command_json() {
    let home = TempDir::new().expect("tempdir");
    armada(home.path())
        .args(["version", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""version": "0.1.0""#));
}

// --- Fingerprint ---

#[test]
fn test_fingerprint_quiet_prints_bare_digest() {
    let home = TempDir::new().expect("tempdir");
    let project = project();
    let output = armada(home.path())
        .args(["fingerprint", "--quiet", "--project"])
        .arg(project.path())
        .output()
        .expect("run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let digest = stdout.trim();
    assert_eq!(digest.len(), 16);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_fingerprint_is_stable_across_runs() {
    let home = TempDir::new().expect("tempdir");
    let project = project();
    let run = || {
        armada(home.path())
            .args(["fingerprint", "--json", "--project"])
            .arg(project.path())
            .output()
            .expect("run")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn test_missing_project_dir_fails() {
    let home = TempDir::new().expect("tempdir");
    armada(home.path())
        .args(["fingerprint", "--project", "/definitely/not/here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

// --- Schema and validate ---

#[test]
fn test_schema_json_lists_global_requirements() {
    let home = TempDir::new().expect("tempdir");
    let project = project();
    armada(home.path())
        .args(["schema", "--json", "--project"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""stack": "dev""#))
        .stdout(predicate::str::contains("TAILSCALE_AUTH_KEY"))
        .stdout(predicate::str::contains("ANTHROPIC_API_KEY"));
}

#[test]
fn test_quiet_schema_prints_no_warnings() {
    let home = TempDir::new().expect("tempdir");
    let project = project();
    std::fs::write(
        project.path().join("identities/pm/identity.yaml"),
        format!("{IDENTITY}plugins: [jira]\n"),
    )
    .expect("identity");

    let output = armada(home.path())
        .args(["--quiet", "schema", "--project"])
        .arg(project.path())
        .output()
        .expect("run");

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(!stderr.contains("jira"), "unexpected stderr: {stderr}");
}

#[test]
fn test_schema_warns_once_about_unknown_plugin() {
    let home = TempDir::new().expect("tempdir");
    let project = project();
    std::fs::write(
        project.path().join("identities/pm/identity.yaml"),
        format!("{IDENTITY}plugins: [jira]\n"),
    )
    .expect("identity");

    let output = armada(home.path())
        .args(["schema", "--project"])
        .arg(project.path())
        .output()
        .expect("run");

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert_eq!(stderr.matches("unknown plugin 'jira'").count(), 1, "{stderr}");
}

#[test]
fn test_schema_without_manifest_fails() {
    let home = TempDir::new().expect("tempdir");
    let empty = TempDir::new().expect("tempdir");
    armada(home.path())
        .args(["schema", "--project"])
        .arg(empty.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No armada.yaml found"));
}

#[test]
fn test_validate_missing_secrets_exits_one() {
    let home = TempDir::new().expect("tempdir");
    let project = project();
    armada(home.path())
        .args(["validate", "--project"])
        .arg(project.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("required secret(s) missing"))
        .stderr(predicate::str::contains("TAILSCALE_AUTH_KEY"));

    let example =
        std::fs::read_to_string(project.path().join(".env.example")).expect(".env.example");
    assert!(example.contains("ANTHROPIC_API_KEY="));
}

#[test]
fn test_validate_missing_secrets_json_error_code() {
    let home = TempDir::new().expect("tempdir");
    let project = project();
    armada(home.path())
        .args(["validate", "--json", "--project"])
        .arg(project.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""error": true"#))
        .stdout(predicate::str::contains(r#""code": "missing_secrets""#));
}

#[test]
fn test_validate_complete_env_succeeds_without_printing_values() {
    let home = TempDir::new().expect("tempdir");
    let project = project();
    std::fs::write(project.path().join(".env"), COMPLETE_ENV).expect(".env");
    armada(home.path())
        .args(["validate", "--json", "--project"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("TAILNET_DNS_NAME"))
        .stdout(predicate::str::contains("tskey-auth-abc123").not())
        .stdout(predicate::str::contains("sk-ant-api03-xyz").not());
}

// --- Config ---

#[test]
fn test_config_set_then_show() {
    let home = TempDir::new().expect("tempdir");
    armada(home.path())
        .args(["config", "set", "hooks.timeout_secs", "45"])
        .assert()
        .success();
    armada(home.path())
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""timeout_secs": 45"#));
}

#[test]
fn test_config_set_unknown_key_fails() {
    let home = TempDir::new().expect("tempdir");
    armada(home.path())
        .args(["config", "set", "security.level", "strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting"));
}

#[test]
fn test_config_set_out_of_range_timeout_json_code() {
    let home = TempDir::new().expect("tempdir");
    armada(home.path())
        .args(["config", "set", "hooks.timeout_secs", "0", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""code": "config_invalid""#));
}
