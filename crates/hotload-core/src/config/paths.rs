//! Default locations for configuration and staging.

use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "hotload.toml";

/// `<config dir>/hotload/hotload.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hotload").join(CONFIG_FILE_NAME))
}

/// `<cache dir>/hotload/staging/<node>`, falling back to the temp dir.
pub fn default_staging_dir(node: &str) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("hotload")
        .join("staging")
        .join(node)
}
