//! Fleet manifest parsing and validation.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::collections::{BTreeMap, BTreeSet};

use armada_common::{FleetManifest, IdentityManifest};

use crate::domain::error::{FleetError, SchemaError};
use crate::domain::identity::referenced_template_vars;

/// File name of the fleet manifest at the project root.
pub const FLEET_MANIFEST_FILE: &str = "armada.yaml";

/// Parses `armada.yaml` content and checks cross-agent rules.
///
/// # Errors
///
/// `FleetError::Parse` on malformed YAML, `FleetError::Invalid` listing
/// every rule violation.
pub fn parse_fleet(content: &str, path: &str) -> Result<FleetManifest, FleetError> {
    let fleet: FleetManifest = serde_yaml::from_str(content).map_err(|e| FleetError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    validate_fleet(&fleet)?;
    Ok(fleet)
}

/// Rules serde cannot express: non-empty names and unique agent names/roles.
///
/// # Errors
///
/// `FleetError::Invalid` with one entry per problem.
pub fn validate_fleet(fleet: &FleetManifest) -> Result<(), FleetError> {
    let mut problems = Vec::new();

    if fleet.stack_name.trim().is_empty() {
        problems.push("stackName must not be empty".to_string());
    }
    if fleet.region.trim().is_empty() {
        problems.push("region must not be empty".to_string());
    }
    if fleet.agents.is_empty() {
        problems.push("agents must list at least one agent".to_string());
    }

    let mut names = BTreeSet::new();
    let mut roles = BTreeSet::new();
    for (i, agent) in fleet.agents.iter().enumerate() {
        if agent.name.trim().is_empty() {
            problems.push(format!("agents[{i}].name must not be empty"));
        } else if !names.insert(agent.name.as_str()) {
            problems.push(format!("agent name '{}' is used more than once", agent.name));
        }
        if agent.role.trim().is_empty() {
            problems.push(format!("agents[{i}].role must not be empty"));
        } else if !is_valid_role(&agent.role) {
            problems.push(format!(
                "agent role '{}' may only contain lowercase letters, digits and '-'",
                agent.role
            ));
        } else if !roles.insert(agent.role.as_str()) {
            problems.push(format!("agent role '{}' is used more than once", agent.role));
        }
        if agent.identity.trim().is_empty() {
            problems.push(format!("agents[{i}].identity must not be empty"));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(FleetError::Invalid(problems))
    }
}

fn is_valid_role(role: &str) -> bool {
    role.starts_with(|c: char| c.is_ascii_lowercase())
        && role
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Template variables identities reference that the fleet does not define.
///
/// # Errors
///
/// `SchemaError::MissingTemplateVars` naming each variable and the roles that
/// need it.
pub fn check_template_vars<'a>(
    defined: &BTreeMap<String, String>,
    identities: impl IntoIterator<Item = (&'a str, &'a IdentityManifest)>,
) -> Result<(), SchemaError> {
    let mut missing: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (role, identity) in identities {
        for var in referenced_template_vars(identity) {
            if !defined.contains_key(var) {
                missing.entry(var).or_default().push(role);
            }
        }
    }
    if missing.is_empty() {
        return Ok(());
    }
    Err(SchemaError::MissingTemplateVars(
        missing
            .into_iter()
            .map(|(var, roles)| format!("{var} (needed by {})", roles.join(", ")))
            .collect(),
    ))
}
