//! Filesystem capability used by the locator and the rewriter.
//!
//! Core code never touches the disk directly: it goes through a
//! [`PackageFs`] scoped to one package root, so the same logic can run over
//! an unpacked directory or any other storage that can list, read and write.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// I/O failure of a filesystem capability.
#[derive(Error, Debug)]
pub enum FsError {
    /// Listing a directory failed.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDir {
        /// Directory that was listed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Reading a file failed.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Writing a file (or creating its parent directory) failed.
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        /// File that was written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Whether the failure is a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        let source = match self {
            Self::ReadDir { source, .. }
            | Self::Read { source, .. }
            | Self::Write { source, .. } => source,
        };
        source.kind() == io::ErrorKind::NotFound
    }
}

/// Read/write view of one package's files.
///
/// Relative paths are resolved against [`PackageFs::root`].
#[async_trait]
pub trait PackageFs: Send + Sync {
    /// Root directory of the view.
    fn root(&self) -> &Path;

    /// Entry names of a directory, in a stable order.
    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, FsError>;

    /// Full contents of a file.
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Replace a file's contents, creating parent directories as needed.
    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FsError>;

    /// Whether a path exists.
    async fn exists(&self, path: &Path) -> bool;

    /// Write a structured manifest as pretty JSON with a trailing newline.
    ///
    /// Object keys keep their insertion order.
    async fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<(), FsError> {
        let mut contents = serde_json::to_vec_pretty(value).map_err(|e| FsError::Write {
            path: path.to_path_buf(),
            source: io::Error::other(e),
        })?;
        contents.push(b'\n');
        self.write_file(path, &contents).await
    }
}

/// [`PackageFs`] backed by the local disk via `tokio::fs`.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    /// Create a view rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a path against the root; absolute paths are used as-is.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl PackageFs for LocalFs {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, FsError> {
        let path = self.resolve(path);
        let err = |source| FsError::ReadDir {
            path: path.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&path).await.map_err(err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(err)? {
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => {
                    tracing::debug!("Skipping non UTF-8 entry {raw:?} in {}", path.display());
                }
            }
        }

        // read_dir order is platform dependent; ranking ties rely on a stable order.
        names.sort();
        Ok(names)
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let path = self.resolve(path);
        tokio::fs::read(&path)
            .await
            .map_err(|source| FsError::Read { path, source })
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FsError> {
        let path = self.resolve(path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FsError::Write {
                    path: path.clone(),
                    source,
                })?;
        }
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| FsError::Write { path, source })
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(self.resolve(path))
            .await
            .unwrap_or(false)
    }
}
