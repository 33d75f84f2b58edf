/*!
 * Database entity models.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a video's media is laid out on the gateway network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    /// Single file addressed directly by the content id
    #[default]
    Legacy,
    /// HLS collection; the content id addresses a directory holding
    /// `manifest.m3u8` plus media segments
    Embed,
}

impl VideoType {
    /// Stored text representation
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::Legacy => "legacy",
            VideoType::Embed => "embed",
        }
    }

    /// Parse the stored text; anything unrecognized is treated as legacy
    pub fn from_db(value: &str) -> Self {
        match value {
            "embed" => VideoType::Embed,
            _ => VideoType::Legacy,
        }
    }
}

/// A stored video reference. Seeded externally; read-only once loaded.
///
/// Identity is `(author, permlink)`; `content_id` addresses the media on
/// the gateway network (the file itself for legacy videos, the HLS
/// directory for embed videos).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    /// Account that published the video
    pub author: String,
    /// Stable slug for the video
    pub permlink: String,
    /// Content identifier for gateway fetch
    pub content_id: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Media layout on the gateway network
    pub video_type: VideoType,
}

impl VideoRef {
    /// A legacy (single-file) video reference
    pub fn new(author: &str, permlink: &str, content_id: &str, created_at: &str) -> Self {
        Self::with_type(author, permlink, content_id, created_at, VideoType::Legacy)
    }

    pub fn with_type(
        author: &str,
        permlink: &str,
        content_id: &str,
        created_at: &str,
        video_type: VideoType,
    ) -> Self {
        Self {
            author: author.to_string(),
            permlink: permlink.to_string(),
            content_id: content_id.to_string(),
            created_at: created_at.to_string(),
            video_type,
        }
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.author, self.permlink)
    }
}

/// Durable record of one generated subtitle file.
///
/// One row per (video, language), upserted on the
/// UNIQUE(author, permlink, language) constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleRecord {
    /// Video author
    pub author: String,
    /// Video permlink
    pub permlink: String,
    /// Content identifier the media was fetched from
    pub video_cid: String,
    /// Subtitle language code
    pub language: String,
    /// Path of the written subtitle file
    pub subtitle_path: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
}

impl SubtitleRecord {
    /// Create a new record stamped with the current time
    pub fn new(
        author: String,
        permlink: String,
        video_cid: String,
        language: String,
        subtitle_path: String,
    ) -> Self {
        Self {
            author,
            permlink,
            video_cid,
            language,
            subtitle_path,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Durable record of a video's content tags, comma-joined.
///
/// One row per video, upserted on the UNIQUE(author, permlink) constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Video author
    pub author: String,
    /// Video permlink
    pub permlink: String,
    /// Comma-joined tags, best first
    pub tags: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
}

impl TagRecord {
    /// Create a new record stamped with the current time
    pub fn new(author: String, permlink: String, tags: String) -> Self {
        Self {
            author,
            permlink,
            tags,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Tags as a list
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split(',').filter(|t| !t.is_empty()).collect()
    }
}
