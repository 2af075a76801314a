//! Local file system abstraction for testability.

use async_trait::async_trait;
use std::path::Path;

/// File system operations used by the pipeline and the uploader.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Creates the directory and any missing parents. Succeeds if it already exists.
    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()>;

    /// Returns the size of a file if it exists.
    async fn file_size(&self, path: &Path) -> Option<u64>;
}

/// Default file system implementation using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn file_size(&self, path: &Path) -> Option<u64> {
        tokio::fs::metadata(path)
            .await
            .ok()
            .filter(std::fs::Metadata::is_file)
            .map(|m| m.len())
    }
}
