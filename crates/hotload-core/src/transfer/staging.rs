//! Transfer into per-target staging directories on a shared filesystem.

use std::path::{Path, PathBuf};

use super::{ArtifactTransfer, Transferred};
use crate::config::DeployConfig;
use crate::error::TransferError;
use crate::types::Target;

/// Copies artifacts into the staging directory configured for each target.
///
/// A target without a staging directory cannot be reached by this transport.
#[derive(Debug, Clone)]
pub struct StagingTransfer {
    local_node: String,
    local_root: PathBuf,
    remote_roots: Vec<(String, PathBuf)>,
}

impl StagingTransfer {
    pub fn from_config(config: &DeployConfig) -> Self {
        let local_root = config.local_staging_dir();
        let remote_roots = config
            .targets
            .iter()
            .map(|(node, entry)| (node.clone(), entry.staging_dir.clone()))
            .collect();

        Self {
            local_node: config.local_node.clone(),
            local_root,
            remote_roots,
        }
    }

    /// Staging directory of `target`, if one is known.
    pub fn staging_root(&self, target: &Target) -> Option<&Path> {
        if target.node() == self.local_node {
            return Some(&self.local_root);
        }
        self.remote_roots
            .iter()
            .find(|(node, _)| node == target.node())
            .map(|(_, root)| root.as_path())
    }

    /// Destination of `source` on `target`, without copying anything.
    pub fn destination_for(&self, target: &Target, source: &Path) -> Option<PathBuf> {
        let root = self.staging_root(target)?;
        let name = source.file_name()?;
        Some(root.join(name))
    }
}

impl ArtifactTransfer for StagingTransfer {
    fn transfer(&self, target: &Target, source: &Path) -> Result<Transferred, TransferError> {
        let root = self
            .staging_root(target)
            .ok_or_else(|| TransferError::Unreachable {
                node: target.node().to_string(),
            })?;

        let name = source.file_name().ok_or_else(|| TransferError::Unreadable {
            path: source.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "artifact path has no file name",
            ),
        })?;

        let unreadable = |e: std::io::Error| TransferError::Unreadable {
            path: source.to_path_buf(),
            source: e,
        };
        let file = std::fs::File::open(source).map_err(unreadable)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update_reader(file).map_err(unreadable)?;
        let digest = hasher.finalize().to_hex().to_string();

        let unwritable = |path: &Path, e: std::io::Error| TransferError::Unwritable {
            node: target.node().to_string(),
            path: path.to_path_buf(),
            source: e,
        };

        std::fs::create_dir_all(root).map_err(|e| unwritable(root, e))?;
        let destination = root.join(name);
        let bytes =
            std::fs::copy(source, &destination).map_err(|e| unwritable(&destination, e))?;

        tracing::debug!(
            node = %target,
            path = %destination.display(),
            bytes,
            "artifact staged"
        );

        Ok(Transferred {
            destination,
            digest,
        })
    }
}
