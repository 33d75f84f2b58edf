/*!
 * Error types for the polysub application.
 *
 * One enum per failure domain so the coordinator can tell fatal failures
 * (no media, no transcript) apart from recoverable ones (tagging, a single
 * target language), using the thiserror crate for ergonomic definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors from the gateway fetcher. Fatal for the video being processed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// A single gateway attempt failed (transport error or bad status)
    #[error("Gateway {gateway} failed: {message}")]
    GatewayFailed {
        /// Gateway base URL
        gateway: String,
        /// Underlying failure description
        message: String,
    },

    /// A single gateway attempt timed out
    #[error("Gateway {gateway} timed out after {timeout_secs}s")]
    GatewayTimeout {
        /// Gateway base URL
        gateway: String,
        /// Timeout that elapsed
        timeout_secs: u64,
    },

    /// Every configured gateway was tried at least once and all failed
    #[error("All {attempted} gateways exhausted for content {content_id}")]
    AllGatewaysExhausted {
        /// Content identifier that could not be fetched
        content_id: String,
        /// Number of gateways attempted
        attempted: usize,
    },

    /// Local I/O error while writing the downloaded bytes
    #[error("Failed to write media file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the speech-recognition engine. Fatal for the video.
#[derive(Error, Debug)]
pub enum TranscriptionError {
    /// The engine call itself failed
    #[error("Transcription engine failed: {0}")]
    EngineFailed(String),

    /// The engine returned no segments at all
    #[error("Transcription produced no segments for {media}")]
    EmptyTranscript {
        /// Media file that produced nothing
        media: String,
    },
}

/// Errors from the zero-shot classification engine. Recoverable: the
/// pipeline degrades to an empty tag set.
#[derive(Error, Debug)]
pub enum TaggingError {
    /// The engine call failed
    #[error("Classification engine failed: {0}")]
    EngineFailed(String),

    /// Nothing to classify (empty transcript sample)
    #[error("No text available for classification")]
    EmptyInput,
}

/// Errors from the translation stage. Recoverable: isolated per language.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The engine call failed
    #[error("Translation engine failed: {0}")]
    EngineFailed(String),

    /// The engine returned a different number of texts than it was given
    #[error("Segment count mismatch: sent {sent}, received {received}")]
    SegmentCountMismatch {
        /// Texts sent to the engine
        sent: usize,
        /// Texts received back
        received: usize,
    },
}

/// Errors writing durable records or subtitle files. Fatal for that record:
/// a language whose record write fails is not counted as succeeded.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Database write failed
    #[error("Record write failed: {0}")]
    Store(String),

    /// Subtitle file write failed
    #[error("Subtitle file write failed: {path}: {message}")]
    File {
        /// Destination path
        path: String,
        /// Underlying failure description
        message: String,
    },
}

/// Errors releasing temporary resources. Logged only, never escalated.
#[derive(Error, Debug)]
pub enum CleanupError {
    /// Temp file removal failed
    #[error("Failed to remove temp file {path}: {message}")]
    RemoveFailed {
        /// Path that could not be removed
        path: String,
        /// Underlying failure description
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error fetching media
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from transcription
    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    /// Error from tagging
    #[error("Tagging error: {0}")]
    Tagging(#[from] TaggingError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error persisting records
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
