//! Rooted filesystem views over a clone's work tree.
//!
//! A [`RepoFs`] confines all reads and writes to its root; operations take
//! repo-relative paths computed by the layout, never absolute paths. Views
//! are cheap to clone and re-root ([`RepoFs::scoped`]), which is how the
//! writer derives an `apps/` view from a repository view.

use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{io_err, RepoError};

// ---------------------------------------------------------------------------
// RepoFs
// ---------------------------------------------------------------------------

/// A filesystem view rooted at one directory of a clone's work tree.
#[derive(Debug, Clone)]
pub struct RepoFs {
    root: PathBuf,
}

impl RepoFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A view rooted at a subdirectory of this view.
    pub fn scoped(&self, rel: impl AsRef<Path>) -> RepoFs {
        RepoFs {
            root: self.root.join(rel),
        }
    }

    /// Absolute path of a repo-relative path.
    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    pub fn exists(&self, rel: impl AsRef<Path>) -> bool {
        self.path(rel).exists()
    }

    pub fn is_dir(&self, rel: impl AsRef<Path>) -> bool {
        self.path(rel).is_dir()
    }

    pub fn read(&self, rel: impl AsRef<Path>) -> Result<Vec<u8>, RepoError> {
        let path = self.path(rel);
        std::fs::read(&path).map_err(|e| io_err(path, e))
    }

    pub fn read_to_string(&self, rel: impl AsRef<Path>) -> Result<String, RepoError> {
        let path = self.path(rel);
        std::fs::read_to_string(&path).map_err(|e| io_err(path, e))
    }

    /// Write one file, creating parent directories as needed.
    pub fn write(&self, rel: impl AsRef<Path>, data: impl AsRef<[u8]>) -> Result<(), RepoError> {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::write(&path, data).map_err(|e| io_err(path, e))
    }

    pub fn remove_file(&self, rel: impl AsRef<Path>) -> Result<(), RepoError> {
        let path = self.path(rel);
        std::fs::remove_file(&path).map_err(|e| io_err(path, e))
    }

    pub fn remove_dir_all(&self, rel: impl AsRef<Path>) -> Result<(), RepoError> {
        let path = self.path(rel);
        std::fs::remove_dir_all(&path).map_err(|e| io_err(path, e))
    }

    /// Names of the entries directly under a directory, sorted. The sibling
    /// counts feeding the delete collapse rule come from here, so the order
    /// must be deterministic.
    pub fn read_dir(&self, rel: impl AsRef<Path>) -> Result<Vec<String>, RepoError> {
        let path = self.path(rel);
        let entries = std::fs::read_dir(&path).map_err(|e| io_err(&path, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Repo-relative paths matching a glob pattern, sorted.
    pub fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>, RepoError> {
        let full = format!(
            "{}/{}",
            Pattern::escape(&self.root.to_string_lossy()),
            pattern
        );
        let paths = glob::glob(&full).map_err(|source| RepoError::Pattern {
            pattern: pattern.to_owned(),
            source,
        })?;

        let mut matches = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| io_err(e.path().to_path_buf(), e.into_error()))?;
            let rel = path.strip_prefix(&self.root).unwrap_or(&path).to_path_buf();
            matches.push(rel);
        }
        matches.sort();
        Ok(matches)
    }
}

// ---------------------------------------------------------------------------
// Bulk writes
// ---------------------------------------------------------------------------

/// One pending file write within a bulk operation.
#[derive(Debug, Clone)]
pub struct BulkWrite {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

impl BulkWrite {
    pub fn new(path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }
}

impl RepoFs {
    /// Apply a batch of writes; the batch is what one commit will contain.
    pub fn bulk_write(&self, writes: &[BulkWrite]) -> Result<(), RepoError> {
        for w in writes {
            self.write(&w.path, &w.data)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
