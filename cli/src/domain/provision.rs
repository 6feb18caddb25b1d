//! Write plan for the provisioning writer.
//!
//! Pure: decides which keys land in the stack and in what order. The writer
//! service applies the plan through the `StackStore` port.

use armada_common::{CloudProvider, FleetManifest};
use serde::Serialize;

use crate::domain::resolution::ResolvedSecrets;
use crate::domain::schema::SecretSchema;
use crate::domain::stack::env_to_store_key;

/// One key to set in the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWrite {
    pub key: String,
    pub value: String,
    pub secret: bool,
}

impl StoreWrite {
    fn plain(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            secret: false,
        }
    }
}

/// Outcome of applying a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<String>,
}

impl WriteReport {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}

/// Store key holding the region or location for `cloud`.
#[must_use]
pub fn region_key(cloud: CloudProvider) -> &'static str {
    match cloud {
        CloudProvider::Aws => "aws:region",
        CloudProvider::Hetzner => "hcloud:location",
    }
}

/// Every write for a fully resolved fleet, in order: provider settings,
/// global values, then each agent's values.
#[must_use]
pub fn plan_writes(
    fleet: &FleetManifest,
    schema: &SecretSchema,
    resolved: &ResolvedSecrets,
    model_provider: &str,
) -> Vec<StoreWrite> {
    let mut writes = vec![
        StoreWrite::plain(region_key(fleet.provider), &fleet.region),
        StoreWrite::plain("armada:provider", fleet.provider.as_str()),
        StoreWrite::plain("armada:instanceType", &fleet.instance_type),
        StoreWrite::plain("armada:modelProvider", model_provider),
    ];

    for agent in &fleet.agents {
        if let Some(instance_type) = &agent.instance_type {
            let key = format!("{}InstanceType", env_to_store_key(&agent.role));
            writes.push(StoreWrite::plain(&key, instance_type));
        }
    }

    for req in schema.all() {
        if let Some(value) = resolved.get(req) {
            writes.push(StoreWrite {
                key: req.store_key.clone(),
                value: value.to_string(),
                secret: req.is_secret,
            });
        }
    }
    writes
}
