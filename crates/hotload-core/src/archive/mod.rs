//! Package archives: format detection and in-place expansion.

pub mod expand;

use std::path::{Component, Path, PathBuf};

use crate::error::ExpansionError;
use crate::types::Target;

pub use expand::LocalExpander;

/// Archive formats a package may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    const SUFFIXES: [(&'static str, ArchiveFormat); 3] = [
        (".tar.gz", ArchiveFormat::TarGz),
        (".tgz", ArchiveFormat::TarGz),
        (".zip", ArchiveFormat::Zip),
    ];

    /// Detect the format from a file name. Matching is case-sensitive.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        Self::SUFFIXES
            .iter()
            .find(|(suffix, _)| name.len() > suffix.len() && name.ends_with(suffix))
            .map(|(_, format)| *format)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

/// Directory a package expands into: the archive path minus its suffix.
///
/// `/staging/shop-1.2.tar.gz` expands into `/staging/shop-1.2`.
pub fn package_root(archive: &Path) -> Option<PathBuf> {
    let name = archive.file_name()?.to_str()?;
    let stem = ArchiveFormat::SUFFIXES
        .iter()
        .find_map(|(suffix, _)| name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())?;
    Some(archive.with_file_name(stem))
}

/// Unpacks a transferred package where the target can load it from.
///
/// Expanding the same archive twice into the same root must leave a usable
/// tree behind that holds only the second archive's entries.
pub trait ArchiveExpander: Send + Sync {
    /// Expand `archive` and return the package root.
    fn expand(&self, target: &Target, archive: &Path) -> Result<PathBuf, ExpansionError>;
}

/// Check that an archive entry path stays inside the package root.
pub(crate) fn enclosed_entry_path(entry: &Path) -> Result<PathBuf, ExpansionError> {
    let mut enclosed = PathBuf::new();
    for component in entry.components() {
        match component {
            Component::Normal(part) => enclosed.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExpansionError::UnsafeEntry {
                    entry: entry.display().to_string(),
                });
            }
        }
    }
    Ok(enclosed)
}
