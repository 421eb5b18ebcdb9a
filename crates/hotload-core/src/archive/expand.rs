//! Expansion of tar.gz and zip packages on a filesystem shared with the target.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::{ArchiveExpander, ArchiveFormat, enclosed_entry_path, package_root};
use crate::error::ExpansionError;
use crate::types::Target;

/// Expands packages in place next to the staged archive.
///
/// The package root is emptied first, so a new version never inherits files
/// or code directories from the previous one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExpander;

impl LocalExpander {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveExpander for LocalExpander {
    fn expand(&self, target: &Target, archive: &Path) -> Result<PathBuf, ExpansionError> {
        let unsupported = || ExpansionError::UnsupportedFormat {
            path: archive.to_path_buf(),
        };
        let format = ArchiveFormat::from_path(archive).ok_or_else(unsupported)?;
        let root = package_root(archive).ok_or_else(unsupported)?;

        let file = File::open(archive).map_err(|e| io_error(archive, e))?;
        clear_root(&root)?;
        std::fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;

        let entries = match format {
            ArchiveFormat::TarGz => expand_tar_gz(file, archive, &root)?,
            ArchiveFormat::Zip => expand_zip(file, archive, &root)?,
        };

        tracing::debug!(
            node = %target,
            path = %root.display(),
            format = format.as_str(),
            entries,
            "package expanded"
        );
        Ok(root)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ExpansionError {
    ExpansionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn clear_root(root: &Path) -> Result<(), ExpansionError> {
    let metadata = match std::fs::symlink_metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_error(root, e)),
    };
    let removed = if metadata.is_dir() {
        std::fs::remove_dir_all(root)
    } else {
        std::fs::remove_file(root)
    };
    removed.map_err(|e| io_error(root, e))?;
    tracing::debug!(path = %root.display(), "cleared previous package root");
    Ok(())
}

fn corrupt(archive: &Path, reason: impl std::fmt::Display) -> ExpansionError {
    ExpansionError::Corrupt {
        path: archive.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn ensure_parent(path: &Path) -> Result<(), ExpansionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    Ok(())
}

fn expand_tar_gz(file: File, archive: &Path, root: &Path) -> Result<usize, ExpansionError> {
    let decoder = flate2::read::GzDecoder::new(file);
    let mut tar = tar::Archive::new(decoder);
    tar.set_overwrite(true);

    let mut count = 0;
    for entry in tar.entries().map_err(|e| corrupt(archive, e))? {
        let mut entry = entry.map_err(|e| corrupt(archive, e))?;
        let raw_path = entry.path().map_err(|e| corrupt(archive, e))?.into_owned();
        let relative = enclosed_entry_path(&raw_path)?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let outpath = root.join(&relative);

        let kind = entry.header().entry_type();
        if kind.is_dir() {
            std::fs::create_dir_all(&outpath).map_err(|e| io_error(&outpath, e))?;
        } else if kind.is_file() {
            ensure_parent(&outpath)?;
            entry
                .unpack(&outpath)
                .map_err(|e| io_error(&outpath, e))?;
        } else {
            tracing::warn!(entry = %raw_path.display(), "skipping non-regular archive entry");
            continue;
        }
        count += 1;
    }
    Ok(count)
}

fn expand_zip(file: File, archive: &Path, root: &Path) -> Result<usize, ExpansionError> {
    let mut zip = zip::ZipArchive::new(file).map_err(|e| corrupt(archive, e))?;

    let mut count = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| corrupt(archive, e))?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ExpansionError::UnsafeEntry {
                entry: entry.name().to_string(),
            })?;
        let relative = enclosed_entry_path(&relative)?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let outpath = root.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath).map_err(|e| io_error(&outpath, e))?;
        } else {
            ensure_parent(&outpath)?;
            let mut buffer = Vec::new();
            entry
                .read_to_end(&mut buffer)
                .map_err(|e| corrupt(archive, e))?;
            std::fs::write(&outpath, &buffer).map_err(|e| io_error(&outpath, e))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))
                        .ok();
                }
            }
        }
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, data) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn expands_tar_gz_next_to_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("shop.tar.gz");
        write_tar_gz(
            &archive,
            &[
                ("manifest.json", b"{}"),
                ("lib/a/ebin/a.beam", b"beam-a"),
            ],
        );

        let root = LocalExpander::new()
            .expand(&Target::new("n@h"), &archive)
            .unwrap();

        assert_eq!(root, temp.path().join("shop"));
        assert_eq!(
            std::fs::read(root.join("lib/a/ebin/a.beam")).unwrap(),
            b"beam-a"
        );
        assert!(root.join("manifest.json").exists());
    }

    #[test]
    fn expands_zip_next_to_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("shop.zip");
        write_zip(&archive, &[("lib/b/ebin/b.beam", b"beam-b")]);

        let root = LocalExpander::new()
            .expand(&Target::new("n@h"), &archive)
            .unwrap();

        assert_eq!(
            std::fs::read(root.join("lib/b/ebin/b.beam")).unwrap(),
            b"beam-b"
        );
    }

    #[test]
    fn expanding_twice_overwrites_in_place() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("shop.tar.gz");
        let target = Target::new("n@h");

        write_tar_gz(&archive, &[("lib/a/ebin/a.beam", b"v1")]);
        LocalExpander::new().expand(&target, &archive).unwrap();
        write_tar_gz(&archive, &[("lib/a/ebin/a.beam", b"v2")]);
        let root = LocalExpander::new().expand(&target, &archive).unwrap();

        assert_eq!(std::fs::read(root.join("lib/a/ebin/a.beam")).unwrap(), b"v2");
    }

    #[test]
    fn reexpansion_drops_files_from_previous_version() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("shop.tar.gz");
        let target = Target::new("n@h");

        write_tar_gz(&archive, &[("lib/a-1.0.0/ebin/a.beam", b"v1")]);
        LocalExpander::new().expand(&target, &archive).unwrap();
        write_tar_gz(&archive, &[("lib/a-1.1.0/ebin/a.beam", b"v2")]);
        let root = LocalExpander::new().expand(&target, &archive).unwrap();

        assert!(!root.join("lib/a-1.0.0").exists());
        assert_eq!(
            std::fs::read(root.join("lib/a-1.1.0/ebin/a.beam")).unwrap(),
            b"v2"
        );
    }

    #[test]
    fn tar_entry_escaping_root_is_rejected() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        std::fs::create_dir_all(&staging).unwrap();
        let archive = staging.join("evil.tar.gz");

        // `append_data` refuses `..`, so the name goes straight into the header.
        let file = File::create(&archive).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let data: &[u8] = b"owned";
        let name: &[u8] = b"../escaped.txt";
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, data).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let err = LocalExpander::new()
            .expand(&Target::new("n@h"), &archive)
            .unwrap_err();

        assert!(matches!(err, ExpansionError::UnsafeEntry { .. }));
        assert!(!staging.join("escaped.txt").exists());
        assert!(!temp.path().join("escaped.txt").exists());
    }

    #[test]
    fn zip_entry_escaping_root_is_rejected() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        std::fs::create_dir_all(&staging).unwrap();
        let archive = staging.join("evil.zip");
        write_zip(&archive, &[("../escaped.txt", b"owned")]);

        let err = LocalExpander::new()
            .expand(&Target::new("n@h"), &archive)
            .unwrap_err();

        assert!(matches!(err, ExpansionError::UnsafeEntry { ref entry } if entry.contains("escaped")));
        assert!(!staging.join("escaped.txt").exists());
        assert!(!temp.path().join("escaped.txt").exists());
    }

    #[test]
    fn corrupt_archive_is_reported() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        std::fs::write(&archive, b"not a zip file").unwrap();

        let err = LocalExpander::new()
            .expand(&Target::new("n@h"), &archive)
            .unwrap_err();
        assert!(matches!(err, ExpansionError::Corrupt { .. }));
    }

    #[test]
    fn corrupt_gzip_is_reported() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.tar.gz");
        std::fs::write(&archive, b"definitely not gzip").unwrap();

        let err = LocalExpander::new()
            .expand(&Target::new("n@h"), &archive)
            .unwrap_err();
        assert!(matches!(err, ExpansionError::Corrupt { .. }));
    }

    #[test]
    fn unknown_format_is_unsupported() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("shop.rar");
        std::fs::write(&archive, b"x").unwrap();

        let err = LocalExpander::new()
            .expand(&Target::new("n@h"), &archive)
            .unwrap_err();
        assert!(matches!(err, ExpansionError::UnsupportedFormat { .. }));
    }
}
