//! Directory-backed storage used by the running server.

use super::{AudioStorage, StoredEntry};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Stores uploads as flat files inside a single directory.
pub struct LocalDirStorage {
    base_path: PathBuf,
}

impl LocalDirStorage {
    /// Open (and create if missing) the upload directory.
    ///
    /// Called once at startup, so the blocking `create_dir_all` is fine here.
    pub fn open(base_path: impl AsRef<Path>) -> io::Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }
}

#[async_trait]
impl AudioStorage for LocalDirStorage {
    fn location(&self) -> String {
        self.base_path.display().to_string()
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let full_path = self.base_path.join(name);

        // create_new: a name collision is an error, never a silent overwrite
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(full_path)
    }

    async fn list(&self) -> io::Result<Vec<StoredEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = dir.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(err) => {
                    debug!("Skipping unreadable entry {:?}: {}", entry.path(), err);
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            entries.push(StoredEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes: metadata.len(),
                modified: metadata.modified()?,
            });
        }

        Ok(entries)
    }

    async fn remove(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.base_path.join(name)).await
    }
}
