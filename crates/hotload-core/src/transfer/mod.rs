//! Artifact transfer: moving a local file somewhere a target can read it.

pub mod staging;

use std::path::{Path, PathBuf};

use crate::error::TransferError;
use crate::types::Target;

pub use staging::StagingTransfer;

/// Where an artifact landed on the target side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transferred {
    /// Path as seen by the target runtime.
    pub destination: PathBuf,
    /// blake3 hex digest of the bytes written.
    pub digest: String,
}

/// Copies a local artifact to a location visible to a target.
///
/// The destination must depend only on the target and the artifact's file
/// name, so that a repeated transfer overwrites instead of duplicating.
pub trait ArtifactTransfer: Send + Sync {
    fn transfer(&self, target: &Target, source: &Path) -> Result<Transferred, TransferError>;
}
