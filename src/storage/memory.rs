//! In-memory storage port for unit tests.

use super::{AudioStorage, StoredEntry};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, (Vec<u8>, SystemTime)>>,
    fail_writes: bool,
    fail_list: bool,
    undeletable: HashSet<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write returns an I/O error.
    pub fn failing_writes() -> Self {
        Self { fail_writes: true, ..Self::default() }
    }

    /// Listing returns an I/O error, as an unreadable directory would.
    pub fn failing_list() -> Self {
        Self { fail_list: true, ..Self::default() }
    }

    /// Removing `name` returns a permission error.
    pub fn with_undeletable(mut self, name: &str) -> Self {
        self.undeletable.insert(name.to_string());
        self
    }

    /// Seed a file whose modification time lies `age` in the past.
    pub fn insert_aged(&self, name: &str, bytes: &[u8], age: Duration) {
        let modified = SystemTime::now() - age;
        self.files.lock().unwrap().insert(name.to_string(), (bytes.to_vec(), modified));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.lock().unwrap().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl AudioStorage for MemoryStorage {
    fn location(&self) -> String {
        "memory://uploads".to_string()
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }

        let mut files = self.files.lock().unwrap();
        if files.contains_key(name) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, name.to_string()));
        }
        files.insert(name.to_string(), (bytes.to_vec(), SystemTime::now()));
        Ok(PathBuf::from("uploads").join(name))
    }

    async fn list(&self) -> io::Result<Vec<StoredEntry>> {
        if self.fail_list {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "unreadable"));
        }

        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .map(|(name, (bytes, modified))| StoredEntry {
                name: name.clone(),
                size_bytes: bytes.len() as u64,
                modified: *modified,
            })
            .collect())
    }

    async fn remove(&self, name: &str) -> io::Result<()> {
        if self.undeletable.contains(name) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, name.to_string()));
        }

        match self.files.lock().unwrap().remove(name) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, name.to_string())),
        }
    }
}
