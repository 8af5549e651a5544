//! # Transcription Module
//!
//! Speech-to-text seam for the service. Only a mock implementation exists:
//! the "transcript" is one of a few canned sentences picked by payload size.
//!
//! ## Key Components:
//! - **Transcriber trait**: What the HTTP and websocket layers call
//! - **MockTranscriber**: Size-bucketed canned output, no audio is decoded
//!
//! ## Two entry points:
//! - `transcribe_upload`: A stored file from `POST /transcribe`, bucketed by KB
//! - `transcribe_stream`: A raw binary websocket frame, bucketed by bytes

pub mod mock;   // Canned size-bucketed transcripts

pub use mock::MockTranscriber;

/// Turns audio into text.
///
/// Implementations must be cheap to call from request handlers; a real
/// engine would sit behind this trait with its own worker pool.
pub trait Transcriber: Send + Sync {
    /// Transcript for an uploaded file of `file_size` bytes.
    fn transcribe_upload(&self, file_size: usize) -> String;

    /// Transcript for a streamed chunk of `audio_len` bytes.
    fn transcribe_stream(&self, audio_len: usize) -> String;
}
