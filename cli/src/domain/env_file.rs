//! `.env` parsing and `.env.example` rendering.

use std::fmt::Write as _;

use crate::domain::resolution::SecretSource;
use crate::domain::schema::{SecretRequirement, SecretSchema};

pub const ENV_FILE: &str = ".env";
pub const ENV_EXAMPLE_FILE: &str = ".env.example";

/// Parses `KEY=value` lines.
///
/// Supports `#` comments, blank lines, an optional `export ` prefix and
/// single or double quotes around the value. Malformed lines are skipped;
/// later duplicates win.
#[must_use]
pub fn parse_env(content: &str) -> SecretSource {
    let mut out = SecretSource::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }
        out.insert(key.to_string(), unquote(value.trim()));
    }
    out
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    // Unquoted values may carry a trailing ` # comment`.
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end().to_string(),
        None => value.to_string(),
    }
}

/// Renders the example file listing every required key.
///
/// Output depends only on the schema.
#[must_use]
pub fn render_env_example(schema: &SecretSchema) -> String {
    let mut out = String::new();
    out.push_str("# Generated by armada. Copy to .env and fill in the values.\n");
    out.push_str("# Regenerated on every run; edits to this file are overwritten.\n");

    out.push_str("\n# ── Global ──\n");
    for req in &schema.global {
        write_entry(&mut out, req);
    }

    for agent in &schema.agents {
        let _ = writeln!(
            out,
            "\n# ── Agent {} ({}, role {}) ──",
            agent.display_name, agent.name, agent.role
        );
        if agent.requirements.is_empty() {
            out.push_str("# (no per-agent secrets)\n");
        }
        for req in &agent.requirements {
            write_entry(&mut out, req);
        }
    }
    out
}

fn write_entry(out: &mut String, req: &SecretRequirement) {
    let sources = req
        .sources
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let class = if req.is_secret { "secret" } else { "plaintext" };
    let _ = write!(out, "# {}; {class}; from {sources}", req.validator.hint());
    if req.auto_resolvable {
        out.push_str("; resolved automatically when unset");
    }
    out.push('\n');
    let _ = writeln!(out, "{}=", req.source_key);
}
