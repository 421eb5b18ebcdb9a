//! Configuration schema for hotload.toml

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{DEFAULT_LOCAL_NODE, Target};

/// Environment variable naming the local node when the file does not.
pub const LOCAL_NODE_ENV: &str = "HOTLOAD_NODE";

/// Root configuration structure for hotload.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Identity of the runtime used when a caller names no target
    #[serde(default = "default_local_node")]
    pub local_node: String,

    /// Staging area for the local node (defaults to the user cache dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,

    /// Upper bound on a single remote call, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_ms: Option<u64>,

    /// Strip the file extension from module paths before loading them
    #[serde(default = "default_true")]
    pub strip_module_extension: bool,

    /// Name of the directories holding compiled code inside a package
    #[serde(default = "default_code_dir_name")]
    pub code_dir_name: String,

    /// Remote targets keyed by node name
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfigEntry>,
}

/// Per-target settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfigEntry {
    /// Directory visible to the target's runtime where artifacts are staged
    pub staging_dir: PathBuf,
}

fn default_local_node() -> String {
    std::env::var(LOCAL_NODE_ENV)
        .ok()
        .filter(|node| !node.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOCAL_NODE.to_string())
}

fn default_true() -> bool {
    true
}

fn default_code_dir_name() -> String {
    "ebin".to_string()
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            local_node: default_local_node(),
            staging_dir: None,
            call_timeout_ms: None,
            strip_module_extension: true,
            code_dir_name: default_code_dir_name(),
            targets: BTreeMap::new(),
        }
    }
}

impl DeployConfig {
    /// Create a configuration for the given local node, staging under `staging_dir`.
    pub fn local(node: impl Into<String>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            local_node: node.into(),
            staging_dir: Some(staging_dir.into()),
            ..Self::default()
        }
    }

    /// Register a remote target with its staging directory.
    pub fn with_target(mut self, node: impl Into<String>, staging_dir: impl Into<PathBuf>) -> Self {
        self.targets.insert(
            node.into(),
            TargetConfigEntry {
                staging_dir: staging_dir.into(),
            },
        );
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn local_target(&self) -> Target {
        Target::new(self.local_node.clone())
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Staging directory of the local node, defaulting under the user cache dir.
    pub fn local_staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| super::paths::default_staging_dir(&self.local_node))
    }

    /// Resolve the staging directory of a target, if the target is known.
    pub fn staging_root(&self, target: &Target) -> Option<PathBuf> {
        if target.node() == self.local_node {
            return Some(self.local_staging_dir());
        }
        self.targets
            .get(target.node())
            .map(|entry| entry.staging_dir.clone())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.local_node.trim().is_empty() {
            anyhow::bail!("local_node must not be empty");
        }
        if self.code_dir_name.trim().is_empty() {
            anyhow::bail!("code_dir_name must not be empty");
        }
        if Path::new(&self.code_dir_name).components().count() != 1 {
            anyhow::bail!(
                "code_dir_name must be a single directory name (got '{}')",
                self.code_dir_name
            );
        }
        if self.call_timeout_ms == Some(0) {
            anyhow::bail!("call_timeout_ms must be greater than zero");
        }
        if self.targets.contains_key(&self.local_node) {
            anyhow::bail!(
                "Target '{}' duplicates local_node; set staging_dir at the top level instead",
                self.local_node
            );
        }
        for (node, entry) in &self.targets {
            if node.trim().is_empty() {
                anyhow::bail!("Target names must not be empty");
            }
            if entry.staging_dir.as_os_str().is_empty() {
                anyhow::bail!("Target '{}' has an empty staging_dir", node);
            }
        }
        Ok(())
    }
}
