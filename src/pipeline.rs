/*!
 * Pipeline coordinator: drives one video at a time through
 * fetch -> transcribe -> tag -> translate -> persist -> cleanup.
 *
 * Videos are processed strictly sequentially because the inference
 * engines are shared process-wide singletons; per-language translation
 * work may fan out over a bounded worker pool. Failures are isolated per
 * stage and per language: a fatal fetch or transcription error stops only
 * the current video, a tagging error never blocks subtitles, and a failed
 * target language never takes its siblings down.
 */

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};

use crate::app_config::Config;
use crate::database::{Repository, SubtitleRecord, TagRecord, VideoRef, VideoType};
use crate::engines::EngineSet;
use crate::errors::PersistenceError;
use crate::fetcher::GatewayFetcher;
use crate::file_utils::FileManager;
use crate::subtitle::{Transcript, render_srt, subtitle_relative_path};
use crate::tagging::TaggingService;
use crate::translation_stage::TranslationStage;
use crate::work_selector::{SelectionOptions, WorkItem, WorkSelector};

/// Terminal classification of one video's processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStatus {
    /// Everything requested succeeded
    Completed,
    /// At least one language succeeded, something else failed
    PartiallyCompleted,
    /// No language succeeded
    Failed,
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoStatus::Completed => write!(f, "completed"),
            VideoStatus::PartiallyCompleted => write!(f, "partially completed"),
            VideoStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-video result accumulator. Never persisted; drives logging and the
/// end-of-run summary.
#[derive(Debug, Default)]
pub struct ProcessingOutcome {
    /// Languages whose subtitle file and record were both written
    pub succeeded_languages: Vec<String>,
    /// Languages skipped by the duration threshold
    pub skipped_languages: Vec<String>,
    /// Failed languages with their error descriptions
    pub failed_languages: HashMap<String, String>,
    /// Tagging failure, if any (never blocks subtitles)
    pub tagging_error: Option<String>,
    /// Fatal error that stopped the video before translation
    pub fatal: Option<String>,
}

impl ProcessingOutcome {
    fn fatal(message: String) -> Self {
        Self {
            fatal: Some(message),
            ..Default::default()
        }
    }

    /// Classify the outcome
    pub fn status(&self) -> VideoStatus {
        if self.fatal.is_some() {
            return VideoStatus::Failed;
        }
        if self.failed_languages.is_empty() && self.tagging_error.is_none() {
            return VideoStatus::Completed;
        }
        if self.succeeded_languages.is_empty() {
            return VideoStatus::Failed;
        }
        VideoStatus::PartiallyCompleted
    }
}

/// Counts for the end-of-run summary
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    /// Videos processed
    pub processed: usize,
    /// Videos fully completed
    pub completed: usize,
    /// Videos partially completed
    pub partial: usize,
    /// Videos with no successful language
    pub failed: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} processed: {} completed, {} partial, {} failed",
            self.processed, self.completed, self.partial, self.failed
        )
    }
}

/// The pipeline coordinator
pub struct Coordinator {
    config: Config,
    engines: EngineSet,
    repository: Repository,
    selector: WorkSelector,
    fetcher: GatewayFetcher,
    translation: TranslationStage,
    tagging: TaggingService,
}

impl Coordinator {
    /// Wire up the coordinator from config, engines, and the store
    pub fn new(config: Config, engines: EngineSet, repository: Repository) -> Result<Self> {
        let fetcher = GatewayFetcher::new(&config.fetch)?;
        let translation =
            TranslationStage::new(engines.translator.clone(), config.processing.batch_size);
        let tagging = TaggingService::new(engines.classifier.clone(), &config.tagging);
        let selector = WorkSelector::new(repository.clone());

        Ok(Self {
            config,
            engines,
            repository,
            selector,
            fetcher,
            translation,
            tagging,
        })
    }

    /// Directory downloaded media is staged in; empty between videos
    pub fn media_temp_dir(&self) -> &std::path::Path {
        self.fetcher.temp_dir()
    }

    /// Run the pipeline over everything the selector finds
    pub async fn run(&self, options: &SelectionOptions) -> Result<RunSummary> {
        let start_time = std::time::Instant::now();

        let languages = self.config.language_codes();
        let items = self.selector.select(&languages, options).await?;

        if items.is_empty() {
            info!("Nothing to do");
            return Ok(RunSummary::default());
        }

        let progress = ProgressBar::new(items.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut summary = RunSummary::default();

        // Sequential outer loop: the engines are shared singletons
        for item in &items {
            progress.set_message(item.video.to_string());

            let outcome = self.process_video(item).await;
            let status = outcome.status();

            summary.processed += 1;
            match status {
                VideoStatus::Completed => summary.completed += 1,
                VideoStatus::PartiallyCompleted => summary.partial += 1,
                VideoStatus::Failed => summary.failed += 1,
            }

            self.log_outcome(&item.video, &outcome);
            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(
            "Run finished in {:.1}s: {}",
            start_time.elapsed().as_secs_f64(),
            summary
        );

        Ok(summary)
    }

    /// Process one video end to end.
    ///
    /// The media guard is dropped on every return path, so the temp file
    /// is gone whatever the terminal state.
    pub async fn process_video(&self, item: &WorkItem) -> ProcessingOutcome {
        let video = &item.video;
        info!(
            "Processing {} (pending: {})",
            video,
            item.pending_languages.join(", ")
        );

        // Fetch; embed videos are HLS collections, legacy videos one file
        let fetched = match video.video_type {
            VideoType::Embed => {
                self.fetcher
                    .fetch_hls(&video.content_id, &video.author, &video.permlink)
                    .await
            }
            VideoType::Legacy => {
                self.fetcher
                    .fetch(&video.content_id, &video.author, &video.permlink)
                    .await
            }
        };
        let media = match fetched {
            Ok(media) => media,
            Err(e) => {
                return ProcessingOutcome::fatal(format!("fetch: {}", e));
            }
        };

        // Transcribe; the guard lives until this function returns
        let transcript = match self.transcribe_with_fallback(media.path()).await {
            Ok(transcript) => transcript,
            Err(message) => {
                return ProcessingOutcome::fatal(format!("transcription: {}", message));
            }
        };
        debug!("{}", transcript);

        let mut outcome = ProcessingOutcome::default();

        // Tag; always attempted, never blocks subtitles
        match self.tagging.tag(&transcript).await {
            Ok(tags) => {
                let record =
                    TagRecord::new(video.author.clone(), video.permlink.clone(), tags.joined());
                if let Err(e) = self.repository.upsert_tag_record(&record).await {
                    outcome.tagging_error = Some(format!("tag record write: {}", e));
                }
            }
            Err(e) => {
                warn!("Tagging failed for {}: {}", video, e);
                outcome.tagging_error = Some(e.to_string());
            }
        }

        // Duration-threshold eligibility
        let duration_ms = transcript.duration_ms();
        let mut eligible = Vec::new();
        for language in &item.pending_languages {
            let accepts = self
                .config
                .language_target(language)
                .map_or(true, |t| t.accepts_duration_ms(duration_ms));
            if accepts {
                eligible.push(language.clone());
            } else {
                debug!(
                    "Skipping {} for {} (video exceeds duration threshold)",
                    language, video
                );
                outcome.skipped_languages.push(language.clone());
            }
        }

        // Translate, render, and persist per language over a bounded pool
        let workers = self.config.processing.translation_workers;
        let results: Vec<(String, Result<(), String>)> = futures::stream::iter(
            eligible.into_iter().map(|language| {
                let video = video.clone();
                let transcript = transcript.clone();
                async move {
                    let result = self.process_language(&video, &transcript, &language).await;
                    (language, result)
                }
            }),
        )
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

        for (language, result) in results {
            match result {
                Ok(()) => outcome.succeeded_languages.push(language),
                Err(message) => {
                    outcome.failed_languages.insert(language, message);
                }
            }
        }
        outcome.succeeded_languages.sort();

        outcome
    }

    /// Transcribe, re-running forced to English when the detected language
    /// is outside the configured set
    async fn transcribe_with_fallback(
        &self,
        media_path: &std::path::Path,
    ) -> Result<Transcript, String> {
        let transcript = self
            .engines
            .transcriber
            .transcribe(media_path, None)
            .await
            .map_err(|e| e.to_string())?;

        let configured = self.config.language_codes();
        if configured.contains(&transcript.source_language) {
            return Ok(transcript);
        }

        warn!(
            "Detected language {} is not configured, re-transcribing as English",
            transcript.source_language
        );
        self.engines
            .transcriber
            .transcribe(media_path, Some("en"))
            .await
            .map_err(|e| e.to_string())
    }

    /// One language: translate, render SRT, write the file, upsert the
    /// record. The language counts as succeeded only if all four happen.
    async fn process_language(
        &self,
        video: &VideoRef,
        transcript: &Transcript,
        language: &str,
    ) -> Result<(), String> {
        let translated = self
            .translation
            .translate(transcript, language)
            .await
            .map_err(|e| e.to_string())?;

        let srt = render_srt(&translated.segments);

        let relative = subtitle_relative_path(&video.author, &video.permlink, language);
        let path = PathBuf::from(&self.config.processing.output_dir).join(&relative);
        FileManager::write_to_file(&path, &srt).map_err(|e| {
            PersistenceError::File {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .to_string()
        })?;

        let record = SubtitleRecord::new(
            video.author.clone(),
            video.permlink.clone(),
            video.content_id.clone(),
            language.to_string(),
            path.display().to_string(),
        );
        self.repository
            .upsert_subtitle_record(&record)
            .await
            .map_err(|e| PersistenceError::Store(e.to_string()).to_string())?;

        debug!("Wrote {} subtitles to {}", language, path.display());
        Ok(())
    }

    fn log_outcome(&self, video: &VideoRef, outcome: &ProcessingOutcome) {
        match outcome.status() {
            VideoStatus::Completed => {
                info!(
                    "{}: completed ({} languages, {} skipped)",
                    video,
                    outcome.succeeded_languages.len(),
                    outcome.skipped_languages.len()
                );
            }
            VideoStatus::PartiallyCompleted => {
                warn!(
                    "{}: partially completed; succeeded [{}], failed [{}]",
                    video,
                    outcome.succeeded_languages.join(", "),
                    outcome
                        .failed_languages
                        .iter()
                        .map(|(l, e)| format!("{}: {}", l, e))
                        .collect::<Vec<_>>()
                        .join("; ")
                );
            }
            VideoStatus::Failed => {
                if let Some(fatal) = &outcome.fatal {
                    error!("{}: failed ({})", video, fatal);
                } else {
                    error!(
                        "{}: failed, no language succeeded ({} errors)",
                        video,
                        outcome.failed_languages.len()
                    );
                }
            }
        }

        if let Some(tagging_error) = &outcome.tagging_error {
            warn!("{}: tagging error: {}", video, tagging_error);
        }
    }
}
