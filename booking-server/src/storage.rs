//! Upload storage
//!
//! Files live under one root directory; callers address them with relative
//! paths such as `package_images/12.jpg`. Paths are checked so nothing
//! outside the root can be read, written or removed.

use serde::Serialize;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Result of removing a stored file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// Already gone; not an error for callers cleaning up
    Missing,
}

/// What happened to each file of a batch removal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileCleanup {
    pub removed: Vec<String>,
    /// Not on disk; the rows were removed anyway
    pub missing_files: Vec<String>,
    /// Still on disk after a failed removal
    pub orphaned_files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute path of a relative upload path, `None` if it would escape the root
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        if relative.as_os_str().is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    pub async fn save(&self, relative: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.resolve(relative).ok_or_else(|| invalid_path(relative))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    pub async fn read(&self, relative: &str) -> io::Result<Vec<u8>> {
        let path = self.resolve(relative).ok_or_else(|| invalid_path(relative))?;
        tokio::fs::read(path).await
    }

    pub async fn remove(&self, relative: &str) -> io::Result<Removal> {
        let path = self.resolve(relative).ok_or_else(|| invalid_path(relative))?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(Removal::Removed),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Removal::Missing),
            Err(e) => Err(e),
        }
    }
}

impl ImageStore {
    /// Remove every file in `paths`, never failing the batch
    pub async fn remove_all(&self, paths: &[String]) -> FileCleanup {
        let mut cleanup = FileCleanup::default();
        for path in paths {
            match self.remove(path).await {
                Ok(Removal::Removed) => cleanup.removed.push(path.clone()),
                Ok(Removal::Missing) => {
                    tracing::warn!(path = %path, "Image file already missing");
                    cleanup.missing_files.push(path.clone());
                }
                Err(e) => {
                    tracing::error!(path = %path, error = %e, "Failed to remove image file");
                    cleanup.orphaned_files.push(path.clone());
                }
            }
        }
        cleanup
    }
}

fn invalid_path(relative: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("invalid upload path: {relative}"),
    )
}
