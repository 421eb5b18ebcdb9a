//! Config store for loading and saving hotload.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{DeployConfig, parser, paths::default_config_path};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store backed by the platform's default config location.
    pub fn default_location() -> anyhow::Result<Self> {
        let config_path = default_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(Self::from_path(config_path))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config, falling back to defaults when the file does not exist.
    pub fn load(&self) -> anyhow::Result<DeployConfig> {
        if !self.config_path.exists() {
            return Ok(DeployConfig::default());
        }
        parser::parse_hotload_toml(&self.config_path)
    }

    pub fn save(&self, config: &DeployConfig) -> anyhow::Result<()> {
        config.validate()?;
        let content = parser::to_toml(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
