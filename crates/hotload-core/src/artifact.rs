//! Local artifact checks used by callers before starting a deployment.

use std::path::Path;

use crate::archive::ArchiveFormat;
use crate::types::ArtifactKind;

/// File extension of a single compiled module image.
pub const MODULE_EXTENSION: &str = "beam";

/// Classify a path by its file name.
pub fn detect_kind(path: &Path) -> Option<ArtifactKind> {
    if let Some(format) = ArchiveFormat::from_path(path) {
        return Some(ArtifactKind::Package(format));
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(MODULE_EXTENSION) => Some(ArtifactKind::Module),
        _ => None,
    }
}

/// Check that a path names an existing regular file of a deployable kind.
///
/// The deploy pipeline never calls this itself; it is a pre-flight check for
/// frontends that want to reject obvious mistakes before touching a target.
pub fn is_valid_artifact(path: &Path) -> bool {
    if detect_kind(path).is_none() {
        return false;
    }
    std::fs::metadata(path)
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
