use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::app_config::EngineConfig;
use crate::engines::Transcriber;
use crate::errors::TranscriptionError;
use crate::subtitle::{Segment, Transcript};

/// HTTP client for a Whisper-compatible speech-recognition server
#[derive(Debug)]
pub struct WhisperEngine {
    /// Base URL of the transcription server
    base_url: String,
    /// Model name to request
    model: String,
    /// HTTP client for making requests
    client: Client,
}

/// One segment in the transcription response, times in seconds
#[derive(Debug, Serialize, Deserialize)]
struct WhisperSegment {
    /// Segment ordinal
    id: usize,
    /// Start time in seconds
    start: f64,
    /// End time in seconds
    end: f64,
    /// Segment text
    text: String,
}

/// Transcription response from the server
#[derive(Debug, Serialize, Deserialize)]
struct WhisperResponse {
    /// Detected (or forced) language code
    language: String,
    /// Segments in engine order
    segments: Vec<WhisperSegment>,
}

impl WhisperEngine {
    /// Create a new engine client from config
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    fn seconds_to_ms(seconds: f64) -> u64 {
        (seconds.max(0.0) * 1000.0).round() as u64
    }
}

#[async_trait]
impl Transcriber for WhisperEngine {
    async fn transcribe(
        &self,
        media_path: &Path,
        forced_language: Option<&str>,
    ) -> Result<Transcript, TranscriptionError> {
        let url = format!("{}/transcribe", self.base_url);
        debug!("Transcribing {} via {}", media_path.display(), url);

        let bytes = tokio::fs::read(media_path)
            .await
            .map_err(|e| TranscriptionError::EngineFailed(format!("Failed to read media: {}", e)))?;

        let file_name = media_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "media.mp4".to_string());

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            )
            .text("model", self.model.clone());

        if let Some(language) = forced_language {
            form = form.text("language", language.to_string());
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::EngineFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(TranscriptionError::EngineFailed(format!(
                "Transcription server error ({}): {}",
                status, body
            )));
        }

        let parsed: WhisperResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::EngineFailed(format!("Invalid response: {}", e)))?;

        if parsed.segments.is_empty() {
            return Err(TranscriptionError::EmptyTranscript {
                media: media_path.display().to_string(),
            });
        }

        // Segment order and timing come through untouched
        let segments: Vec<Segment> = parsed
            .segments
            .into_iter()
            .map(|s| {
                Segment::new(
                    s.id,
                    Self::seconds_to_ms(s.start),
                    Self::seconds_to_ms(s.end),
                    s.text.trim().to_string(),
                )
            })
            .collect();

        info!(
            "Transcribed {} segments, detected language {}",
            segments.len(),
            parsed.language
        );

        Ok(Transcript {
            source_language: parsed.language,
            segments,
        })
    }
}
