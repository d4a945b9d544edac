use super::ArchiveStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

/// Archive store backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileStore;

impl LocalFileStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArchiveStore for LocalFileStore {
    async fn load(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))
    }

    async fn store(&self, path: &Path, data: &[u8]) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        fs::write(path, data)
            .await
            .with_context(|| format!("writing {}", path.display()))
    }
}
