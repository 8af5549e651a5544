//! # Upload Validation
//!
//! Pure functions over an incoming payload: no I/O happens here, which keeps
//! every rule testable with plain byte slices.

use crate::config::UploadConfig;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Why an upload was refused or could not be stored.
///
/// ## Error Categories:
/// - **UnsupportedFormat**: Declared content type is not allow-listed
/// - **TooLarge**: Payload exceeds the configured maximum
/// - **EmptyFile**: Payload has no bytes
/// - **StorageFailure**: Validation passed but the write failed (not retried)
#[derive(Debug, Clone, PartialEq)]
pub enum UploadError {
    UnsupportedFormat(String),
    TooLarge { size: usize, max: usize },
    EmptyFile,
    StorageFailure(String),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::UnsupportedFormat(content_type) => {
                write!(f, "Unsupported audio format: {}", content_type)
            }
            UploadError::TooLarge { max, .. } => {
                write!(f, "File too large, maximum supported size is {}MB", max / 1024 / 1024)
            }
            UploadError::EmptyFile => write!(f, "Audio file must not be empty"),
            UploadError::StorageFailure(_) => write!(f, "Failed to save file"),
        }
    }
}

impl std::error::Error for UploadError {}

/// The rules an upload is checked against, derived from [`UploadConfig`].
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_content_types: HashSet<String>,
    pub max_file_size: usize,
    pub default_extension: String,
    pub assumed_bitrate_bps: u32,
}

impl UploadPolicy {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            allowed_content_types: config
                .allowed_content_types
                .iter()
                .map(|ct| ct.trim().to_ascii_lowercase())
                .collect(),
            max_file_size: config.max_file_size,
            default_extension: normalize_extension(&config.default_extension),
            assumed_bitrate_bps: config.assumed_bitrate_bps,
        }
    }

    /// Run the validation checks in order; the first failure wins.
    ///
    /// A missing content type is tolerated, only a declared one is checked.
    pub fn validate(&self, bytes: &[u8], content_type: Option<&str>) -> Result<(), UploadError> {
        if let Some(content_type) = content_type {
            let normalized = content_type.trim().to_ascii_lowercase();
            if !self.allowed_content_types.contains(&normalized) {
                return Err(UploadError::UnsupportedFormat(content_type.to_string()));
            }
        }

        if bytes.len() > self.max_file_size {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                max: self.max_file_size,
            });
        }

        if bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        Ok(())
    }

    /// Extension (with leading dot, lower-cased) for the stored file.
    ///
    /// Falls back to the default when the original name is missing, has no
    /// suffix, or has a suffix that is not plain alphanumerics.
    pub fn resolve_extension(&self, original_filename: Option<&str>) -> String {
        original_filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_else(|| self.default_extension.clone())
    }

    /// Advisory playback length in seconds, rounded to two decimals.
    pub fn estimate_duration(&self, size_bytes: usize) -> f64 {
        let seconds = (size_bytes as f64 * 8.0) / self.assumed_bitrate_bps as f64;
        (seconds * 100.0).round() / 100.0
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        ".wav".to_string()
    } else {
        format!(".{}", ext.to_ascii_lowercase())
    }
}
