//! # Audio Upload Module
//!
//! Validates and persists audio files posted to `/transcribe`.
//!
//! ## Key Components:
//! - **Validation**: Content-type allow-list, size limits, extension and duration helpers
//! - **Store**: Assigns identifiers, writes through the storage port, sweeps old files
//!
//! ## Validation Order:
//! 1. Declared content type (if any) must be allow-listed
//! 2. Payload must not exceed the configured maximum
//! 3. Payload must not be empty
//!
//! The first failing check decides the error returned to the client.

pub mod store;        // Upload persistence, cleanup sweep, directory stats
pub mod validation;   // Pure checks and derived metadata

pub use store::AudioStore;
pub use validation::{UploadError, UploadPolicy};
