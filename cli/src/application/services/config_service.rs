//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::ArmadaConfig;

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<ArmadaConfig> {
    store.load()
}

/// Save configuration.
pub fn save_config(store: &impl ConfigStore, config: &ArmadaConfig) -> Result<()> {
    store.save(config)
}

/// Validate and persist a single `key = value` setting.
///
/// # Errors
///
/// Returns an error if the key or value is invalid, or the file cannot be
/// read or written. The file is untouched on validation errors.
pub fn set_config_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<ArmadaConfig> {
    let mut config = load_config(store)?;
    config.set(key, value)?;
    save_config(store, &config)?;
    Ok(config)
}
