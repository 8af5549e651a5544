//! # Configuration Management
//!
//! This module handles loading and managing application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Key Rust Concepts Used:
//! - **Serde**: Serialization/deserialization library for converting between Rust structs and data formats
//! - **derive macros**: Automatically generate code for common traits (Debug, Clone, Serialize, Deserialize)
//! - **impl blocks**: Add methods to structs
//! - **Result<T, E>**: Error handling that forces you to handle potential failures
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Platform variables (HOST, PORT)
//! 2. Environment variables (APP_SERVER__PORT, APP_UPLOAD__MAX_FILE_SIZE, etc.)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main application configuration that contains all settings.
///
/// ## Why separate config structs:
/// Each group maps to one concern of the service (HTTP listener, upload store,
/// background maintenance, websocket liveness), so a `config.toml` reads the
/// same way the code is organised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub maintenance: MaintenanceConfig,
    pub websocket: WebSocketConfig,
}

/// Server-specific configuration settings.
///
/// ## Common values:
/// - `host = "127.0.0.1"`: Only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: Accept connections from any IP address (cloud deployments)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Audio upload store settings.
///
/// ## Fields:
/// - `directory`: Where accepted uploads are written (created on startup)
/// - `max_file_size`: Largest accepted payload in bytes
/// - `allowed_content_types`: Declared MIME types accepted by `/transcribe`
/// - `default_extension`: Used when the original filename has no suffix
/// - `assumed_bitrate_bps`: Constant bitrate behind the duration estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub directory: PathBuf,
    pub max_file_size: usize,
    pub allowed_content_types: Vec<String>,
    pub default_extension: String,
    pub assumed_bitrate_bps: u32,
}

/// Background cleanup of old uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Files older than this are removed by the sweep
    pub cleanup_max_age_hours: u64,
    /// How often the sweep runs; 0 disables the background task
    pub cleanup_interval_minutes: u64,
}

/// Websocket heartbeat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
}

/// Provides default configuration values.
///
/// ## Why defaults matter:
/// Default values ensure the application can start even if no configuration file exists.
/// They also serve as documentation of reasonable starting values.
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            upload: UploadConfig {
                directory: PathBuf::from("uploads"),
                max_file_size: 10 * 1024 * 1024, // 10 MiB
                allowed_content_types: [
                    "audio/wav",
                    "audio/mpeg",
                    "audio/mp3",
                    "audio/m4a",
                    "audio/ogg",
                    "audio/webm",
                    "audio/mp4",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                default_extension: ".wav".to_string(),
                assumed_bitrate_bps: 128_000,
            },
            maintenance: MaintenanceConfig {
                cleanup_max_age_hours: 24,
                cleanup_interval_minutes: 60,
            },
            websocket: WebSocketConfig {
                heartbeat_interval_secs: 30,
                client_timeout_secs: 60,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    /// 4. Handle special cases for HOST and PORT environment variables
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__PORT=3000`: Override server port
    /// - `APP_UPLOAD__DIRECTORY=/data/uploads`: Override upload directory
    /// - `APP_UPLOAD__ALLOWED_CONTENT_TYPES=audio/wav,audio/ogg`: Comma-separated list
    /// - `PORT=3000`: Special case for deployment platforms
    ///
    /// Nested keys use a double underscore because field names such as
    /// `max_file_size` already contain single underscores.
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("upload.allowed_content_types"),
            );

        // Deployment platforms (Railway, Render, Heroku) inject these directly
        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## Why validate:
    /// Catching configuration errors early prevents runtime failures and
    /// provides clear error messages about what's wrong.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.upload.directory.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Upload directory cannot be empty"));
        }

        if self.upload.max_file_size == 0 {
            return Err(anyhow::anyhow!("Max file size must be greater than 0"));
        }

        if self.upload.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("At least one allowed content type is required"));
        }

        if self.upload.assumed_bitrate_bps == 0 {
            return Err(anyhow::anyhow!("Assumed bitrate must be greater than 0"));
        }

        if self.websocket.heartbeat_interval_secs >= self.websocket.client_timeout_secs {
            return Err(anyhow::anyhow!(
                "Heartbeat interval ({}s) must be shorter than client timeout ({}s)",
                self.websocket.heartbeat_interval_secs,
                self.websocket.client_timeout_secs
            ));
        }

        Ok(())
    }
}
