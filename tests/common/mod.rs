/*!
 * Common test utilities for the polysub test suite
 */

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use polysub::app_config::{Config, FetchConfig, LanguageTarget};
use polysub::database::{Repository, VideoRef};
use polysub::engines::EngineSet;
use polysub::engines::mock::{MockClassifier, MockTranscriber, MockTranslator};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Config with en/es/fr targets, pointed at a single mock gateway and a
/// temporary output directory
pub fn test_config(gateway_url: &str, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.languages = vec![
        LanguageTarget::new("en", "English", 0),
        LanguageTarget::new("es", "Spanish", 0),
        LanguageTarget::new("fr", "French", 0),
    ];
    config.fetch = FetchConfig {
        gateways: vec![gateway_url.to_string()],
        timeout_secs: 10,
        max_retries: 0,
        backoff_base_ms: 1,
    };
    config.processing.output_dir = output_dir.display().to_string();
    config
}

/// Engine set where everything works; transcripts are detected as `language`
pub fn working_engines(language: &str) -> EngineSet {
    EngineSet {
        transcriber: Arc::new(MockTranscriber::working(language)),
        translator: Arc::new(MockTranslator::working()),
        classifier: Arc::new(MockClassifier::working()),
    }
}

/// In-memory repository seeded with a single video
pub async fn seeded_repository(author: &str, permlink: &str, cid: &str) -> Result<Repository> {
    let repo = Repository::new_in_memory()?;
    repo.insert_video(&VideoRef::new(author, permlink, cid, "2026-01-15T12:00:00Z"))
        .await?;
    Ok(repo)
}
