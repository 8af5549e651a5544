//! # Upload Storage Port
//!
//! Narrow interface over the file system side effects of the upload store:
//! writing a payload, listing what is stored, and removing an entry.
//!
//! ## Why a trait here:
//! The validation and bookkeeping in [`crate::audio::AudioStore`] never touch
//! `std::fs` directly. Production wires in [`LocalDirStorage`]; unit tests use
//! an in-memory port so they can simulate aged files and I/O failures without
//! a real disk.
//!
//! ## Rust Concepts:
//! - **#[async_trait]**: Lets a trait declare `async fn` and still be used as
//!   `Arc<dyn AudioStorage>`
//! - **Send + Sync**: The store is shared across actix worker threads

pub mod local;
#[cfg(test)]
pub mod memory;

pub use local::LocalDirStorage;

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

/// One regular file found in the storage location.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub name: String,
    pub size_bytes: u64,
    pub modified: SystemTime,
}

#[async_trait]
pub trait AudioStorage: Send + Sync {
    /// Human-readable location (directory path) reported by stats.
    fn location(&self) -> String;

    /// Persist `bytes` under `name`, returning the full path written.
    /// Must fail rather than overwrite an existing entry.
    async fn write(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf>;

    /// All regular files currently stored. Directories are skipped.
    async fn list(&self) -> io::Result<Vec<StoredEntry>>;

    /// Remove a single entry by name.
    async fn remove(&self, name: &str) -> io::Result<()>;
}
