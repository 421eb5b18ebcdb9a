//! Shared deployment types.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::archive::ArchiveFormat;

/// Node name used when nothing else identifies the local runtime.
pub const DEFAULT_LOCAL_NODE: &str = "nonode@nohost";

/// Identity of the runtime a deployment is aimed at.
///
/// A target is only referenced for the duration of a call; nothing here owns
/// or tracks the remote process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    node: String,
}

impl Target {
    pub fn new(node: impl Into<String>) -> Self {
        Self { node: node.into() }
    }

    pub fn node(&self) -> &str {
        &self.node
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node)
    }
}

/// Identifier of a module that is live in a target's code table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub String);

impl ModuleId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an artifact contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A single compiled module image (`.beam`).
    Module,
    /// A packaged release holding applications and a manifest.
    Package(ArchiveFormat),
}

/// A deployable file selected from the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    kind: ArtifactKind,
}

impl Artifact {
    /// Classify a path by its file name. Returns `None` for unknown extensions.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = crate::artifact::detect_kind(&path)?;
        Some(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn is_package(&self) -> bool {
        matches!(self.kind, ArtifactKind::Package(_))
    }
}
