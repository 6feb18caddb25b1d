//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries
//! (domain → application → infra/commands/output) hold.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a test-only block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.starts_with("#[cfg(test)]") || trimmed.starts_with("#[cfg(all(test") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

fn src_dir(layer: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer)
}

fn rel(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
        .replace('\\', "/")
}

/// Lines of non-test code in `layer` containing any of `patterns`.
fn scan_layer(layer: &str, patterns: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir(layer)) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            if in_test || trimmed.starts_with("//") {
                continue;
            }
            if let Some(pattern) = patterns.iter().find(|p| line.contains(*p)) {
                violations.push(format!("{}:{}: `{pattern}`: {trimmed}", rel(&file), i + 1));
            }
        }
    }
    violations
}

// ── Domain purity ─────────────────────────────────────────────────────────────

#[test]
fn domain_has_no_io_or_outer_layer_imports() {
    let violations = scan_layer(
        "domain",
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
            "std::env::var",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay pure:\n{}",
        violations.join("\n")
    );
}

// ── Application layer boundary ────────────────────────────────────────────────

#[test]
fn application_has_no_infra_or_output_imports() {
    let violations = scan_layer(
        "application",
        &["crate::infra", "crate::output", "crate::commands"],
    );
    assert!(
        violations.is_empty(),
        "application/ must not import from infra/, output/ or commands/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_has_no_direct_io() {
    let violations = scan_layer(
        "application",
        &["std::fs::", "std::process::Command", "tokio::process", "std::env::var"],
    );
    assert!(
        violations.is_empty(),
        "application/ must route I/O through ports:\n{}",
        violations.join("\n")
    );
}

// ── Infrastructure boundary ───────────────────────────────────────────────────

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = scan_layer("infra", &["crate::commands", "crate::output"]);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let violations = scan_layer("infra", &["println!", "eprintln!"]);
    assert!(
        violations.is_empty(),
        "infra/ must log with tracing, not print:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_tokio_command_runner_new_outside_infra() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&Path::new(env!("CARGO_MANIFEST_DIR")).join("src")) {
        let path = rel(&file);
        if path.contains("/infra/") || path.ends_with("app.rs") {
            continue;
        }
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if line.contains("TokioCommandRunner::new")
                || line.contains("TokioCommandRunner::default")
            {
                violations.push(format!("{path}:{}: {line}", i + 1));
            }
        }
    }
    assert!(
        violations.is_empty(),
        "Only app.rs constructs command runners:\n{}",
        violations.join("\n")
    );
}

// ── Commands ──────────────────────────────────────────────────────────────────

#[test]
fn no_inline_json_branching_in_commands() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir("commands")) {
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            let trimmed = line.trim();
            if line.contains("json: bool")
                || trimmed.starts_with("if json")
                || trimmed.starts_with("if !json")
                || line.contains("is_json()")
            {
                violations.push(format!("{}:{}: {trimmed}", rel(&file), i + 1));
            }
        }
    }
    assert!(
        violations.is_empty(),
        "Found inline JSON branching in commands/: use app.renderer() instead:\n{}",
        violations.join("\n")
    );
}

#[test]
fn command_handlers_accept_app_context() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir("commands")) {
        let path = rel(&file);
        if path.ends_with("mod.rs") {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        if !content.contains("fn run(app: &AppContext") {
            violations.push(path);
        }
    }
    assert!(
        violations.is_empty(),
        "Every command's run() must take &AppContext first:\n{}",
        violations.join("\n")
    );
}

#[test]
fn commands_use_standardized_confirmation() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir("commands")) {
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if line.contains("stdin().lock()") || line.contains("Confirm::new()") {
                violations.push(format!("{}:{}: {line}", rel(&file), i + 1));
            }
        }
    }
    assert!(
        violations.is_empty(),
        "Commands must use app.confirm() for user prompts:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_module_level_dead_code_allows_in_layers() {
    let mut violations = Vec::new();
    for layer in ["domain", "application", "infra", "commands", "output"] {
        for file in collect_rs_files(&src_dir(layer)) {
            let Ok(content) = std::fs::read_to_string(&file) else {
                continue;
            };
            for (i, line) in content.lines().enumerate() {
                if line.trim() == "#![allow(dead_code)]" {
                    violations.push(format!("{}:{}", rel(&file), i + 1));
                }
            }
        }
    }
    assert!(
        violations.is_empty(),
        "Module-level #![allow(dead_code)] found:\n{}",
        violations.join("\n")
    );
}
