//! Release manifest schema
//!
//! Defines the structure of the `manifest.json` file at the root of an
//! expanded package:
//!
//! ```json
//! {
//!   "name": "shop",
//!   "version": "1.2.0",
//!   "applications": ["db", "web"],
//!   "config": { "web": { "port": 4000 } }
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExpansionError;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Parsed description of a package's applications and runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// Release name
    pub name: String,

    /// Release version
    pub version: semver::Version,

    /// Applications in the order they should be started
    pub applications: Vec<String>,

    /// Runtime configuration keyed by application name
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

impl ReleaseManifest {
    /// Parse a manifest from JSON and validate it.
    pub fn from_json(content: &str) -> Result<Self, String> {
        let manifest: ReleaseManifest =
            serde_json::from_str(content).map_err(|e| e.to_string())?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read `manifest.json` from an expanded package root.
    pub fn load(package_root: &Path) -> Result<Self, ExpansionError> {
        let path = package_root.join(MANIFEST_FILE_NAME);
        let content = std::fs::read_to_string(&path).map_err(|e| ExpansionError::Manifest {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|reason| ExpansionError::Manifest { path, reason })
    }

    pub fn declares(&self, application: &str) -> bool {
        self.applications.iter().any(|app| app == application)
    }

    /// Configuration as sent to a target runtime.
    pub fn runtime_config(&self) -> serde_json::Value {
        serde_json::Value::Object(self.config.clone())
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("release name must not be empty".to_string());
        }
        let mut seen = HashSet::new();
        for app in &self.applications {
            if app.trim().is_empty() {
                return Err("application names must not be empty".to_string());
            }
            if !seen.insert(app.as_str()) {
                return Err(format!("application '{}' is declared twice", app));
            }
        }
        Ok(())
    }
}
