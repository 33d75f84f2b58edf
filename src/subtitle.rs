use std::fmt;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// @module: Segment model and SRT serialization

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

/// One timestamped unit of transcript or subtitle text.
///
/// Timestamps are integer milliseconds so that "timing unchanged" is plain
/// equality. The pipeline never reorders or renumbers segments coming out of
/// the transcription engine; renumbering happens only at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    // @field: Ordinal as produced by the transcription engine
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Segment text
    pub text: String,
}

impl Segment {
    /// Creates a new segment
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: String) -> Self {
        Segment { index, start_ms, end_ms, text }
    }

    /// Creates a segment after validating the time range
    pub fn new_validated(index: usize, start_ms: u64, end_ms: u64, text: String) -> Result<Self> {
        if end_ms <= start_ms {
            return Err(anyhow!(
                "Invalid time range: end time {} <= start time {}",
                end_ms, start_ms
            ));
        }
        Ok(Segment { index, start_ms, end_ms, text })
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.split(&[':', ','][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse()?;
        let minutes: u64 = parts[1].parse()?;
        let seconds: u64 = parts[2].parse()?;
        let millis: u64 = parts[3].parse()?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }
}

/// The ordered transcript of one video, as produced by the speech engine.
///
/// Owned exclusively by the coordinator for the duration of one video's
/// processing; never shared across videos.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Language detected (or forced) during transcription
    pub source_language: String,

    /// Segments in engine order
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Full transcript text, space-joined in segment order
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text of segments starting within the first `window_ms` milliseconds
    pub fn sample_text(&self, window_ms: u64) -> String {
        self.segments
            .iter()
            .filter(|s| s.start_ms < window_ms)
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Video duration in milliseconds, taken from the last segment
    pub fn duration_ms(&self) -> u64 {
        self.segments.last().map_or(0, |s| s.end_ms)
    }
}

/// A transcript translated into one target language.
///
/// Structurally identical to [`Transcript`]: same segment count, identical
/// `start_ms`/`end_ms` index-wise, only `text` differs.
#[derive(Debug, Clone)]
pub struct TranslatedTranscript {
    /// Target language code
    pub language: String,

    /// Segments with original timing and translated text
    pub segments: Vec<Segment>,
}

/// Ranked tag set from the classification engine, descending by score.
#[derive(Debug, Clone, Default)]
pub struct TagResult {
    /// Tags, best first
    pub tags: Vec<String>,

    /// Scores parallel to `tags`
    pub scores: Vec<f64>,
}

impl TagResult {
    /// Tags joined with commas, the durable representation
    pub fn joined(&self) -> String {
        self.tags.join(",")
    }
}

/// Render a segment sequence as SRT text.
///
/// Entries are renumbered 1-based at render time regardless of the original
/// indices, so numbering is contiguous even if upstream indices have gaps.
/// Text is written verbatim, including embedded newlines, with a blank line
/// separating entries.
pub fn render_srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!(
            "{} --> {}\n",
            Segment::format_timestamp(segment.start_ms),
            Segment::format_timestamp(segment.end_ms)
        ));
        out.push_str(segment.text.trim());
        out.push_str("\n\n");
    }
    out
}

/// Parse SRT text back into segments.
///
/// Used for round-trip validation. Unlike a general-purpose SRT reader this
/// does not re-sort or repair entries: order on disk is order returned.
pub fn parse_srt(content: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();

    let mut current_index: Option<usize> = None;
    let mut current_start_ms: Option<u64> = None;
    let mut current_end_ms: Option<u64> = None;
    let mut current_text = String::new();

    // An entry with index and timing is kept even when its text is empty,
    // so whitespace-only segments survive a round trip
    let mut flush = |index: Option<usize>,
                     start: Option<u64>,
                     end: Option<u64>,
                     text: &str|
     -> Option<Segment> {
        match (index, start, end) {
            (Some(index), Some(start_ms), Some(end_ms)) => {
                Some(Segment::new(index, start_ms, end_ms, text.trim_end().to_string()))
            }
            _ => None,
        }
    };

    for line in content.lines() {
        let trimmed = line.trim_end();

        if trimmed.trim().is_empty() {
            if let Some(segment) =
                flush(current_index, current_start_ms, current_end_ms, &current_text)
            {
                segments.push(segment);
            }
            current_index = None;
            current_start_ms = None;
            current_end_ms = None;
            current_text.clear();
            continue;
        }

        // Sequence number only at the start of an entry
        if current_index.is_none() && current_text.is_empty() {
            if let Ok(num) = trimmed.trim().parse::<usize>() {
                current_index = Some(num);
                continue;
            }
        }

        if current_index.is_some() && current_start_ms.is_none() {
            if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                current_start_ms = Some(capture_to_ms(&caps, 1));
                current_end_ms = Some(capture_to_ms(&caps, 5));
                continue;
            }
        }

        if current_index.is_some() && current_start_ms.is_some() {
            if !current_text.is_empty() {
                current_text.push('\n');
            }
            current_text.push_str(trimmed);
        }
    }

    // Last entry without trailing blank line
    if let Some(segment) = flush(current_index, current_start_ms, current_end_ms, &current_text) {
        segments.push(segment);
    }

    if segments.is_empty() {
        return Err(anyhow!("No valid subtitle entries were found in the SRT content"));
    }

    Ok(segments)
}

fn capture_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
    let hours: u64 = caps.get(start_idx).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let minutes: u64 = caps.get(start_idx + 1).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let seconds: u64 = caps.get(start_idx + 2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let millis: u64 = caps.get(start_idx + 3).map_or(0, |m| m.as_str().parse().unwrap_or(0));

    (hours * 3600 + minutes * 60 + seconds) * 1000 + millis
}

/// Relative subtitle path convention: `{author}/{permlink}.{language}.srt`
pub fn subtitle_relative_path(author: &str, permlink: &str, language: &str) -> PathBuf {
    Path::new(author).join(format!("{}.{}.srt", permlink, language))
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Transcript [{}]: {} segments, {:.1} min",
            self.source_language,
            self.segments.len(),
            self.duration_ms() as f64 / 60_000.0
        )
    }
}
