use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target languages for subtitle generation
    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageTarget>,

    /// Gateway fetch config
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Inference engine endpoints
    #[serde(default)]
    pub engines: EnginesConfig,

    /// Tagging config
    #[serde(default)]
    pub tagging: TaggingConfig,

    /// Processing config
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Database config
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// One configured target language
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LanguageTarget {
    // @field: ISO 639-1 code
    pub code: String,

    // @field: Display name
    #[serde(default = "String::new")]
    pub name: String,

    // @field: Longest video (in minutes) this language is generated for; 0 = unlimited
    #[serde(default)]
    pub max_duration_min: u64,
}

impl LanguageTarget {
    pub fn new(code: &str, name: &str, max_duration_min: u64) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            max_duration_min,
        }
    }

    /// Whether this language applies to a video of the given duration
    pub fn accepts_duration_ms(&self, duration_ms: u64) -> bool {
        self.max_duration_min == 0 || duration_ms <= self.max_duration_min * 60_000
    }
}

/// Gateway fetch configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetchConfig {
    /// Gateway base URLs, tried in order
    #[serde(default = "default_gateways")]
    pub gateways: Vec<String>,

    /// Per-gateway timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts against the final gateway
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            gateways: default_gateways(),
            timeout_secs: default_fetch_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

/// Single inference engine endpoint
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    // @field: Service URL
    pub endpoint: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: Timeout seconds
    #[serde(default = "default_engine_timeout_secs")]
    pub timeout_secs: u64,
}

impl EngineConfig {
    fn new(endpoint: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            timeout_secs,
        }
    }
}

/// Inference engine endpoints
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EnginesConfig {
    /// Speech-recognition engine
    #[serde(default = "default_transcription_engine")]
    pub transcription: EngineConfig,

    /// Translation engine
    #[serde(default = "default_translation_engine")]
    pub translation: EngineConfig,

    /// Zero-shot classification engine
    #[serde(default = "default_classification_engine")]
    pub classification: EngineConfig,
}

impl Default for EnginesConfig {
    fn default() -> Self {
        Self {
            transcription: default_transcription_engine(),
            translation: default_translation_engine(),
            classification: default_classification_engine(),
        }
    }
}

/// Tagging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaggingConfig {
    /// Candidate labels for zero-shot classification
    #[serde(default = "default_vocabulary")]
    pub vocabulary: Vec<String>,

    /// Maximum number of tags to keep
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,

    /// Minimum confidence score for a tag
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Transcript sample window in seconds
    #[serde(default = "default_sample_duration_secs")]
    pub sample_duration_secs: u64,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            vocabulary: default_vocabulary(),
            max_tags: default_max_tags(),
            min_confidence: default_min_confidence(),
            sample_duration_secs: default_sample_duration_secs(),
        }
    }
}

/// Processing configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProcessingConfig {
    /// Directory where subtitle files are written
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Earliest video creation date to consider (RFC 3339)
    #[serde(default)]
    pub start_date: Option<String>,

    /// Segments per translation request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent per-language translation workers
    #[serde(default = "default_translation_workers")]
    pub translation_workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            start_date: None,
            batch_size: default_batch_size(),
            translation_workers: default_translation_workers(),
        }
    }
}

/// Database configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Database file path; empty uses the platform data directory
    #[serde(default = "String::new")]
    pub path: String,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_languages() -> Vec<LanguageTarget> {
    vec![
        LanguageTarget::new("en", "English", 0),
        LanguageTarget::new("es", "Spanish", 0),
        LanguageTarget::new("fr", "French", 0),
    ]
}

fn default_gateways() -> Vec<String> {
    vec![
        "https://ipfs-3speak.b-cdn.net/ipfs".to_string(),
        "https://ipfs.io/ipfs".to_string(),
        "https://cloudflare-ipfs.com/ipfs".to_string(),
    ]
}

fn default_fetch_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3 // Default to 3 extra attempts on the last gateway
}

fn default_backoff_base_ms() -> u64 {
    500 // 500ms base backoff time, doubled on each retry
}

fn default_engine_timeout_secs() -> u64 {
    600
}

fn default_transcription_engine() -> EngineConfig {
    EngineConfig::new("http://localhost:9000", "whisper-small", 600)
}

fn default_translation_engine() -> EngineConfig {
    EngineConfig::new("http://localhost:9001", "nllb-200-distilled-600M", 600)
}

fn default_classification_engine() -> EngineConfig {
    EngineConfig::new("http://localhost:9002", "bart-large-mnli", 120)
}

fn default_vocabulary() -> Vec<String> {
    [
        "gaming", "music", "news", "politics", "sports", "technology",
        "travel", "food", "finance", "education", "comedy", "science",
        "health", "art", "nature",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_tags() -> usize {
    5
}

fn default_min_confidence() -> f64 {
    0.3
}

fn default_sample_duration_secs() -> u64 {
    120
}

fn default_output_dir() -> String {
    "subtitles".to_string()
}

fn default_batch_size() -> usize {
    8 // Segments per translation request
}

fn default_translation_workers() -> usize {
    1 // Sequential by default; engine memory is the scarce resource
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow!("Failed to read config file {}: {}", path.as_ref().display(), e)
        })?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(anyhow!("At least one target language must be configured"));
        }

        // Validate language codes
        for target in &self.languages {
            let _name = crate::language_utils::get_language_name(&target.code)?;
        }

        if self.fetch.gateways.is_empty() {
            return Err(anyhow!("At least one gateway must be configured"));
        }

        for gateway in &self.fetch.gateways {
            let parsed = url::Url::parse(gateway)
                .map_err(|e| anyhow!("Invalid gateway URL {}: {}", gateway, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(anyhow!("Gateway URL must be http(s): {}", gateway));
            }
        }

        if self.processing.batch_size == 0 {
            return Err(anyhow!("batch_size must be at least 1"));
        }

        if self.processing.translation_workers == 0 {
            return Err(anyhow!("translation_workers must be at least 1"));
        }

        if self.tagging.vocabulary.is_empty() {
            return Err(anyhow!("Tagging vocabulary must not be empty"));
        }

        if !(0.0..=1.0).contains(&self.tagging.min_confidence) {
            return Err(anyhow!("min_confidence must be between 0.0 and 1.0"));
        }

        if let Some(date) = &self.processing.start_date {
            chrono::DateTime::parse_from_rfc3339(date)
                .map_err(|e| anyhow!("Invalid start_date {}: {}", date, e))?;
        }

        Ok(())
    }

    /// Configured language codes in declaration order
    pub fn language_codes(&self) -> Vec<String> {
        self.languages.iter().map(|l| l.code.clone()).collect()
    }

    /// Look up a configured language target by code
    pub fn language_target(&self, code: &str) -> Option<&LanguageTarget> {
        self.languages.iter().find(|l| l.code == code)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            languages: default_languages(),
            fetch: FetchConfig::default(),
            engines: EnginesConfig::default(),
            tagging: TaggingConfig::default(),
            processing: ProcessingConfig::default(),
            database: DatabaseConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
