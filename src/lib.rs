/*!
 * # polysub
 *
 * A Rust library for generating multilingual subtitles and content tags
 * for stored videos.
 *
 * ## Features
 *
 * - Select videos that still need work, per language, from a metadata store
 * - Fetch media from an ordered list of content gateways with fallback
 * - Transcribe speech with segment timing preserved end to end
 * - Translate transcripts into configured target languages
 * - Derive content tags via zero-shot classification
 * - Write SRT subtitle files and durable per-language records
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `work_selector`: Language-granular work selection
 * - `fetcher`: Gateway downloads with temp-file lifetime management
 * - `engines`: Inference engine interfaces and clients:
 *   - `engines::whisper`: Speech-recognition client
 *   - `engines::nllb`: Translation client
 *   - `engines::classifier`: Zero-shot classification client
 *   - `engines::mock`: Deterministic engines for testing
 * - `translation_stage`: Batched translation with timing preservation
 * - `tagging`: Vocabulary classification over transcripts
 * - `subtitle`: Segment model and SRT serialization
 * - `pipeline`: The per-video processing coordinator
 * - `database`: SQLite-backed metadata store
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod engines;
pub mod errors;
pub mod fetcher;
pub mod file_utils;
pub mod language_utils;
pub mod pipeline;
pub mod subtitle;
pub mod tagging;
pub mod translation_stage;
pub mod work_selector;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{Repository, SubtitleRecord, TagRecord, VideoRef};
pub use engines::EngineSet;
pub use errors::AppError;
pub use pipeline::{Coordinator, ProcessingOutcome, RunSummary, VideoStatus};
pub use subtitle::{Segment, TagResult, TranslatedTranscript, Transcript};
pub use work_selector::{SelectionOptions, WorkItem, WorkSelector};
