//! # Error Handling
//!
//! This module defines the errors returned by HTTP handlers and how they're
//! converted to HTTP responses.
//!
//! ## Key Rust Concepts for Error Handling:
//!
//! ### Enums for Error Types
//! - **Variants**: Each enum variant represents a different kind of error
//! - **Data**: Each variant can hold additional information (String, nested errors)
//! - **Pattern matching**: Use `match` to handle different error types
//!
//! ### Traits for Error Conversion
//! - **From trait**: Automatically converts between error types (enables `?`)
//! - **ResponseError trait**: Converts errors to HTTP responses
//! - **Display trait**: Defines how errors are formatted as strings
//!
//! ## JSON Response Format:
//! All errors return JSON with a consistent structure:
//! ```json
//! {
//!   "error": {
//!     "type": "file_too_large",
//!     "message": "File too large, maximum supported size is 10MB",
//!     "timestamp": "2025-01-01T12:00:00Z"
//!   }
//! }
//! ```

use crate::audio::UploadError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Errors surfaced to API clients.
///
/// ## Error Categories:
/// - **BadRequest**: Malformed request (broken multipart body, missing file)
/// - **ValidationError**: Well-formed request with unacceptable content
/// - **Upload**: The upload store refused or failed to store the file
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    ValidationError(String),
    Upload(UploadError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Upload(err) => write!(f, "Upload error: {}", err),
        }
    }
}

impl AppError {
    /// HTTP status, machine-readable type, and client-facing message.
    ///
    /// Storage failures keep their I/O detail in the logs only.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::Upload(err) => {
                let (status, error_type) = match err {
                    UploadError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "unsupported_format"),
                    UploadError::TooLarge { .. } => (StatusCode::BAD_REQUEST, "file_too_large"),
                    UploadError::EmptyFile => (StatusCode::BAD_REQUEST, "empty_file"),
                    UploadError::StorageFailure(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
                    }
                };
                (status, error_type, err.to_string())
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = self.parts();

        HttpResponse::build(status).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

/// Lets handlers use `?` on `AudioStore::save`.
impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::Upload(err)
    }
}

/// A multipart body that cannot be parsed is the client's fault.
impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("Invalid multipart body: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_upload_error_status_mapping() {
        let cases = [
            (UploadError::UnsupportedFormat("text/plain".into()), StatusCode::BAD_REQUEST),
            (UploadError::TooLarge { size: 2, max: 1 }, StatusCode::BAD_REQUEST),
            (UploadError::EmptyFile, StatusCode::BAD_REQUEST),
            (UploadError::StorageFailure("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let response = AppError::from(UploadError::EmptyFile).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["error"]["type"], "empty_file");
        assert_eq!(value["error"]["message"], "Audio file must not be empty");
        assert!(value["error"]["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn test_storage_failure_hides_io_detail() {
        let response = AppError::from(UploadError::StorageFailure("/var/x: EACCES".into())).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("storage_error"));
        assert!(!text.contains("EACCES"));
    }
}
