//! Stack naming and fingerprint rules.
//!
//! Pure functions only: no I/O, no async.

use std::fmt::Write as _;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Store key holding the fingerprint of the project that created a stack.
pub const FINGERPRINT_KEY: &str = "armada:stackFingerprint";

/// Number of hex characters kept from a SHA-256 digest.
const SHORT_DIGEST_LEN: usize = 16;

/// Lowercase hex of `bytes`.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// First 16 hex characters of SHA-256 over `input`.
#[must_use]
pub fn short_digest(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = hex_encode(&digest);
    hex.truncate(SHORT_DIGEST_LEN);
    hex
}

/// Deterministic fingerprint of a project, derived from its absolute path.
#[must_use]
pub fn stack_fingerprint(project_root: &Path) -> String {
    short_digest(&project_root.to_string_lossy())
}

/// `LINEAR_API_KEY` → `linearApiKey`.
#[must_use]
pub fn env_to_store_key(env_var: &str) -> String {
    let mut out = String::with_capacity(env_var.len());
    for (i, word) in env_var
        .split(['_', '-'])
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let lower = word.to_ascii_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            out.push_str(&capitalize(&lower));
        }
    }
    out
}

/// Store key of a per-agent value: `pm` + `LINEAR_API_KEY` → `pmLinearApiKey`.
#[must_use]
pub fn agent_store_key(role: &str, env_var: &str) -> String {
    let mut out = env_to_store_key(role);
    out.push_str(&capitalize(&env_to_store_key(env_var)));
    out
}

/// `eng-lead` → `ENG_LEAD`.
#[must_use]
pub fn role_env_prefix(role: &str) -> String {
    role.to_ascii_uppercase().replace('-', "_")
}

/// Key an operator sets in `.env` for a per-agent value: `PM_LINEAR_API_KEY`.
#[must_use]
pub fn agent_source_key(role: &str, env_var: &str) -> String {
    format!("{}_{env_var}", role_env_prefix(role))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
