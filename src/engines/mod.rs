/*!
 * Engine interfaces for the inference backends.
 *
 * This module defines the capability traits the pipeline depends on:
 * - `Transcriber`: speech recognition over a media file
 * - `Translator`: batch text translation
 * - `Classifier`: zero-shot label classification
 *
 * Production implementations are HTTP clients against inference servers;
 * deterministic mocks live in [`mock`].
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use crate::errors::{TaggingError, TranscriptionError, TranslationError};
use crate::subtitle::Transcript;

/// Speech-recognition engine boundary.
///
/// Engine timestamps are ground truth: implementations must return segments
/// exactly as produced, without reordering or overlap correction.
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    /// Transcribe a media file.
    ///
    /// # Arguments
    /// * `media_path` - Path to the downloaded media file
    /// * `forced_language` - Skip language detection and transcribe as this
    ///   ISO 639-1 code when set
    ///
    /// # Returns
    /// * `Result<Transcript, TranscriptionError>` - Segments in engine order
    ///   plus the detected (or forced) language
    async fn transcribe(
        &self,
        media_path: &Path,
        forced_language: Option<&str>,
    ) -> Result<Transcript, TranscriptionError>;
}

/// Translation engine boundary. Receives text only, never timing.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate a batch of texts, preserving order and count.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, TranslationError>;
}

/// Zero-shot classification engine boundary.
#[async_trait]
pub trait Classifier: Send + Sync + Debug {
    /// Score `labels` against `text`, returned as (label, score) pairs in
    /// descending score order.
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<(String, f64)>, TaggingError>;
}

/// The process-wide engine singletons, constructed once at startup and
/// injected into the pipeline coordinator.
#[derive(Debug, Clone)]
pub struct EngineSet {
    /// Speech-recognition engine
    pub transcriber: Arc<dyn Transcriber>,
    /// Translation engine
    pub translator: Arc<dyn Translator>,
    /// Classification engine
    pub classifier: Arc<dyn Classifier>,
}

pub mod classifier;
pub mod mock;
pub mod nllb;
pub mod whisper;
