//! Temporary output next to the destination, swapped in by atomic rename.

use std::fs::{self, File, Permissions};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// A temporary file in the destination's directory.
///
/// Dropping a staged archive without committing removes the temporary file,
/// so every failure path leaves the destination untouched.
pub(crate) struct StagedArchive {
    file: NamedTempFile,
    destination: PathBuf,
}

impl StagedArchive {
    /// Creates the temporary file beside `destination`.
    pub fn create(destination: &Path) -> Result<Self> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file = tempfile::Builder::new()
            .prefix(".jarmod-")
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(|source| Error::ArchiveReplaceFailed {
                destination: destination.to_path_buf(),
                source,
            })?;
        log::trace!("staging rewrite in {}", file.path().display());
        Ok(Self {
            file,
            destination: destination.to_path_buf(),
        })
    }

    pub fn as_file(&self) -> &File {
        self.file.as_file()
    }

    /// Flushes the temporary file to disk and renames it over the
    /// destination.
    pub fn commit(self, permissions: Option<Permissions>) -> Result<()> {
        let destination = self.destination;
        let replace_failed = |source| Error::ArchiveReplaceFailed {
            destination: destination.clone(),
            source,
        };

        self.file.as_file().sync_all().map_err(replace_failed)?;
        if let Some(permissions) = permissions {
            fs::set_permissions(self.file.path(), permissions).map_err(replace_failed)?;
        }
        self.file
            .persist(&destination)
            .map_err(|e| replace_failed(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_commit_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.jar");
        fs::write(&destination, b"old").unwrap();

        let staged = StagedArchive::create(&destination).unwrap();
        staged.as_file().write_all(b"new").unwrap();
        staged.commit(None).unwrap();

        assert_eq!(fs::read(&destination).unwrap(), b"new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_drop_removes_temporary() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.jar");
        {
            let staged = StagedArchive::create(&destination).unwrap();
            staged.as_file().write_all(b"partial").unwrap();
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_swap_reports_destination() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("occupied");
        fs::create_dir(&destination).unwrap();
        fs::write(destination.join("keep"), b"x").unwrap();

        let staged = StagedArchive::create(&destination).unwrap();
        match staged.commit(None) {
            Err(Error::ArchiveReplaceFailed { destination: d, .. }) => assert_eq!(d, destination),
            other => panic!("Expected ArchiveReplaceFailed, got: {:?}", other),
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("missing").join("out.jar");
        assert!(matches!(
            StagedArchive::create(&destination),
            Err(Error::ArchiveReplaceFailed { .. })
        ));
    }
}
