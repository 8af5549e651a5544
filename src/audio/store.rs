//! # Audio Upload Store
//!
//! Accepts validated payloads, names them, and persists them through an
//! [`AudioStorage`] port. Also owns the maintenance side of the upload
//! directory: sweeping old files and reporting aggregate stats.
//!
//! ## Lifecycle of an upload:
//! 1. **Validated** against the [`UploadPolicy`]
//! 2. **Named** `<uuid><ext>` so concurrent uploads never collide
//! 3. **Written** once; a failed write surfaces as `StorageFailure`
//! 4. **Swept** by `cleanup` once older than the age threshold

use crate::audio::validation::{UploadError, UploadPolicy};
use crate::storage::AudioStorage;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Reported when the client did not declare a content type.
const UNKNOWN_CONTENT_TYPE: &str = "audio/unknown";

/// Metadata returned for a stored upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub file_id: String,
    /// Stored name: `file_id` plus extension
    pub filename: String,
    pub file_path: String,
    pub file_size: usize,
    pub content_type: String,
    /// Seconds, advisory only
    pub duration_estimate: f64,
    pub status: &'static str,
}

/// Aggregate view of the upload directory.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UploadStats {
    pub total_files: usize,
    pub total_size_mb: f64,
    pub upload_dir: String,
}

/// Validating front door to the upload directory.
///
/// Cheap to clone: the storage port is behind an `Arc` and the policy is
/// plain data.
#[derive(Clone)]
pub struct AudioStore {
    storage: Arc<dyn AudioStorage>,
    policy: UploadPolicy,
}

impl AudioStore {
    pub fn new(storage: Arc<dyn AudioStorage>, policy: UploadPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validate and persist one upload.
    ///
    /// ## Returns:
    /// - **Ok(UploadedFile)**: bytes written under a fresh identifier
    /// - **Err(UploadError)**: first failing validation check, or
    ///   `StorageFailure` if the write itself failed. Nothing is written
    ///   when validation fails.
    pub async fn save(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
        original_filename: Option<&str>,
    ) -> Result<UploadedFile, UploadError> {
        self.policy.validate(bytes, content_type)?;

        let file_id = Uuid::new_v4().to_string();
        let extension = self.policy.resolve_extension(original_filename);
        let filename = format!("{}{}", file_id, extension);

        let path = self.storage.write(&filename, bytes).await.map_err(|err| {
            error!("Failed to save audio file {}: {}", filename, err);
            UploadError::StorageFailure(err.to_string())
        })?;

        info!(file_id = %file_id, size = bytes.len(), "Audio file saved: {}", filename);

        Ok(UploadedFile {
            file_id,
            filename,
            file_path: path.display().to_string(),
            file_size: bytes.len(),
            content_type: content_type.unwrap_or(UNKNOWN_CONTENT_TYPE).to_string(),
            duration_estimate: self.policy.estimate_duration(bytes.len()),
            status: "saved",
        })
    }

    /// Remove every stored file older than `max_age_hours`.
    ///
    /// Best effort: a file that cannot be removed is logged and skipped, and
    /// an unreadable directory ends the sweep with a warning. Returns the
    /// number of files removed.
    pub async fn cleanup(&self, max_age_hours: u64) -> usize {
        let max_age = Duration::from_secs(max_age_hours.saturating_mul(3600));
        let now = SystemTime::now();

        let entries = match self.storage.list().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Upload cleanup could not read {}: {}", self.storage.location(), err);
                return 0;
            }
        };

        let mut cleaned = 0;
        for entry in entries {
            // mtime in the future counts as brand new
            let age = now.duration_since(entry.modified).unwrap_or_default();
            if age <= max_age {
                continue;
            }

            match self.storage.remove(&entry.name).await {
                Ok(()) => {
                    cleaned += 1;
                    debug!("Removed expired upload: {}", entry.name);
                }
                Err(err) => warn!("Failed to remove expired upload {}: {}", entry.name, err),
            }
        }

        if cleaned > 0 {
            info!("Upload cleanup removed {} expired files", cleaned);
        }

        cleaned
    }

    /// File count and total size of the upload directory.
    ///
    /// Never fails: a listing error yields zeroed stats.
    pub async fn stats(&self) -> UploadStats {
        let upload_dir = self.storage.location();

        match self.storage.list().await {
            Ok(entries) => {
                let total_bytes: u64 = entries.iter().map(|e| e.size_bytes).sum();
                let total_size_mb = (total_bytes as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0;
                UploadStats {
                    total_files: entries.len(),
                    total_size_mb,
                    upload_dir,
                }
            }
            Err(err) => {
                debug!("Upload stats unavailable for {}: {}", upload_dir, err);
                UploadStats {
                    total_files: 0,
                    total_size_mb: 0.0,
                    upload_dir,
                }
            }
        }
    }
}
