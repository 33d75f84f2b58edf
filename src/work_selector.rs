/*!
 * Work selection: decides which videos need processing and for which
 * languages.
 *
 * Selection is read-only and language-granular: the pending set for a
 * video is the configured languages minus those already recorded, computed
 * once up front. Videos with nothing pending are excluded entirely, which
 * is what makes re-runs idempotent.
 */

use anyhow::{Result, anyhow};
use log::{debug, info};

use crate::database::{Repository, VideoRef};

/// One video together with the languages still missing for it
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// The video to process
    pub video: VideoRef,
    /// Languages with no subtitle record yet, in configured order
    pub pending_languages: Vec<String>,
}

/// Selection options
#[derive(Debug, Clone, Default)]
pub struct SelectionOptions {
    /// Earliest creation date to consider (ISO 8601)
    pub start_date: Option<String>,
    /// Reprocess all configured languages regardless of existing records
    pub force: bool,
    /// Select exactly one video by (author, permlink)
    pub only: Option<(String, String)>,
}

/// Read-only selector over the metadata store
#[derive(Clone)]
pub struct WorkSelector {
    repository: Repository,
}

impl WorkSelector {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Select the videos that still need work.
    ///
    /// The effective start date is the later of the configured start date
    /// and the creation date of the most recently recorded video, so
    /// repeated runs skip straight past fully processed history. `force`
    /// bypasses the existing-record check; single-video mode bypasses the
    /// date filter entirely.
    pub async fn select(
        &self,
        languages: &[String],
        options: &SelectionOptions,
    ) -> Result<Vec<WorkItem>> {
        if languages.is_empty() {
            return Err(anyhow!("No target languages configured"));
        }

        let candidates = match &options.only {
            Some((author, permlink)) => {
                let video = self
                    .repository
                    .video_by_author_permlink(author, permlink)
                    .await?
                    .ok_or_else(|| anyhow!("Video not found: {}/{}", author, permlink))?;
                vec![video]
            }
            None => {
                let effective_start = self.effective_start_date(options).await?;
                debug!("Selecting videos created at or after {}", effective_start);
                self.repository.videos_since(&effective_start).await?
            }
        };

        let mut items = Vec::new();
        for video in candidates {
            let pending = if options.force {
                languages.to_vec()
            } else {
                let existing = self
                    .repository
                    .existing_subtitle_languages(&video.author, &video.permlink)
                    .await?;
                languages
                    .iter()
                    .filter(|lang| !existing.contains(lang))
                    .cloned()
                    .collect()
            };

            if pending.is_empty() {
                debug!("Skipping {} (all languages recorded)", video);
                continue;
            }

            items.push(WorkItem {
                video,
                pending_languages: pending,
            });
        }

        info!("Selected {} videos with pending work", items.len());
        Ok(items)
    }

    /// Later of the configured start date and the processing cursor
    async fn effective_start_date(&self, options: &SelectionOptions) -> Result<String> {
        let configured = options
            .start_date
            .clone()
            .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string());

        match self.repository.last_recorded_video_date().await? {
            Some(cursor) if cursor > configured => Ok(cursor),
            _ => Ok(configured),
        }
    }
}
