//! Outcome of a successful package deployment.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::release::ReleaseManifest;
use crate::types::Target;

#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub target: Target,
    pub release: String,
    pub version: semver::Version,
    /// Where the package was expanded on the target side
    pub package_root: PathBuf,
    /// Code directories registered with the target
    pub code_paths: Vec<PathBuf>,
    /// Applications started, in start order
    pub started: Vec<String>,
    /// blake3 digest of the transferred archive
    pub digest: String,
    pub completed_at: DateTime<Utc>,
}

impl DeployReport {
    pub(crate) fn new(
        target: Target,
        manifest: &ReleaseManifest,
        package_root: PathBuf,
        code_paths: Vec<PathBuf>,
        started: Vec<String>,
        digest: String,
    ) -> Self {
        Self {
            target,
            release: manifest.name.clone(),
            version: manifest.version.clone(),
            package_root,
            code_paths,
            started,
            digest,
            completed_at: Utc::now(),
        }
    }
}
