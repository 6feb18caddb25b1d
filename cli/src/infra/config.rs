//! Infrastructure implementation of the `ConfigStore` port.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::ports::ConfigStore;
use crate::domain::config::ArmadaConfig;

/// Base directory for armada's user state.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn armada_home() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(".armada"))
}

/// Cache root for identity clones: the configured `cache.dir`, else
/// `~/.armada/cache/identities`.
///
/// # Errors
///
/// Returns an error if no directory is configured and the home directory
/// cannot be determined.
pub fn identity_cache_dir(config: &ArmadaConfig) -> Result<PathBuf> {
    match &config.cache.dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(armada_home()?.join("cache").join("identities")),
    }
}

/// Production implementation of `ConfigStore` that uses a YAML file on disk.
pub struct YamlConfigStore;

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<ArmadaConfig> {
        let path = self.path()?;
        if !path.exists() {
            return Ok(ArmadaConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn save(&self, config: &ArmadaConfig) -> Result<()> {
        let path = self.path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(config).context("cannot serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("cannot write {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot set permissions on {}", path.display()))?;
        }
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        if let Ok(val) = std::env::var("ARMADA_CONFIG") {
            return Ok(PathBuf::from(val));
        }
        Ok(armada_home()?.join("config.yaml"))
    }
}
