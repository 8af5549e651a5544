//! # Audio Upload Handler
//!
//! `POST /transcribe` accepts a multipart form carrying one audio file, stores
//! it through the [`AudioStore`](crate::audio::AudioStore) and returns a mock
//! transcript together with the stored file's metadata.
//!
//! ## Streaming limit:
//! The file field is buffered only up to `max_file_size + 1` bytes. That is
//! enough for the store to classify the upload as too large without holding
//! an arbitrarily large body in memory.

use crate::error::AppError;
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpResponse, Result as ActixResult};
use futures_util::StreamExt;
use serde_json::json;
use tracing::{debug, info};

/// Preferred form field name for the audio file.
const AUDIO_FIELD: &str = "audio_file";

/// The file part of the form, read into memory.
struct ReceivedFile {
    bytes: Vec<u8>,
    content_type: Option<String>,
    filename: Option<String>,
}

/// Upload an audio file and get a mock transcript back.
///
/// ## Endpoint: `POST /transcribe`
///
/// ## Request:
/// `multipart/form-data` with an `audio_file` field (any field carrying a
/// filename is accepted as well).
///
/// ## Response:
/// ```json
/// {
///   "transcription": "...",
///   "file_info": { "file_id": "...", "filename": "....wav", "status": "saved", ... },
///   "timestamp": "2025-01-01T12:00:00Z",
///   "status": "completed"
/// }
/// ```
///
/// ## Errors:
/// - **400**: no file in the form, unsupported type, empty or too large
/// - **500**: the file could not be written
pub async fn transcribe(
    state: web::Data<AppState>,
    payload: Multipart,
) -> ActixResult<HttpResponse, AppError> {
    let limit = state.uploads.policy().max_file_size.saturating_add(1);

    let upload = read_audio_field(payload, limit)
        .await?
        .ok_or_else(|| AppError::BadRequest("No audio file detected".to_string()))?;

    let file_info = state
        .uploads
        .save(&upload.bytes, upload.content_type.as_deref(), upload.filename.as_deref())
        .await?;

    let transcription = state.transcriber.transcribe_upload(file_info.file_size);
    info!(file_id = %file_info.file_id, "Upload transcribed");

    Ok(HttpResponse::Ok().json(json!({
        "transcription": transcription,
        "file_info": file_info,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "status": "completed"
    })))
}

/// Find the audio field and buffer at most `limit` bytes of it.
///
/// Other fields are skipped. Reading stops at the first matching field.
async fn read_audio_field(
    mut payload: Multipart,
    limit: usize,
) -> Result<Option<ReceivedFile>, AppError> {
    while let Some(field) = payload.next().await {
        let mut field = field?;

        let filename = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_string);
        if field.name() != Some(AUDIO_FIELD) && filename.is_none() {
            continue;
        }

        // Unparseable headers are passed through verbatim and fail the allow-list
        let content_type = match field.content_type() {
            Some(mime) => Some(mime.essence_str().to_string()),
            None => field
                .headers()
                .get(header::CONTENT_TYPE)
                .map(|value| String::from_utf8_lossy(value.as_bytes()).trim().to_string()),
        };
        let mut bytes = Vec::new();

        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            let take = chunk.len().min(limit - bytes.len());
            bytes.extend_from_slice(&chunk[..take]);

            if bytes.len() >= limit {
                debug!("Upload exceeds {} bytes, stopped reading", limit - 1);
                break;
            }
        }

        return Ok(Some(ReceivedFile {
            bytes,
            content_type,
            filename,
        }));
    }

    Ok(None)
}
