mod local;

pub use local::LocalFileStore;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for loading and persisting whole archives
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Read the complete archive at `path` into memory
    async fn load(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace the archive at `path` with `data`
    async fn store(&self, path: &Path, data: &[u8]) -> Result<()>;
}
