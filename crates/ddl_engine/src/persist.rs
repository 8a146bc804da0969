//! Crash-safe replacement of small state files.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("cannot prepare directory {path}: {message}")]
    Directory { path: String, message: String },
    #[error("{0} does not name a file")]
    NotAFile(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Replaces one file's contents as a whole: readers see either the old or the new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicFileWriter {
    target: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(target: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let target = target.into();
        if target.file_name().is_none() {
            return Err(PersistError::NotAFile(target.display().to_string()));
        }
        Ok(Self { target })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Directory the temp file is staged in; a bare file name stages in `.`.
    fn staging_dir(&self) -> &Path {
        match self.target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn write(&self, content: &str) -> Result<(), PersistError> {
        let dir = self.staging_dir();
        fs::create_dir_all(dir).map_err(|err| PersistError::Directory {
            path: dir.display().to_string(),
            message: err.to_string(),
        })?;

        // Staged beside the target; the rename must not cross filesystems.
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(content.as_bytes())?;
        staged.as_file_mut().sync_all()?;
        staged
            .persist(&self.target)
            .map_err(|err| PersistError::Io(err.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_parent_and_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("state.ron");
        let writer = AtomicFileWriter::new(&target).unwrap();

        writer.write("first").unwrap();
        writer.write("second").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        let leftovers = fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        assert!(matches!(
            AtomicFileWriter::new("/"),
            Err(PersistError::NotAFile(_))
        ));
    }
}
