/*!
 * Mock engine implementations for testing.
 *
 * This module provides deterministic engines that simulate different
 * behaviors:
 * - `MockTranscriber::working(lang)` - Canned segments in a given language
 * - `MockTranslator::working()` - Tags each text with the target language
 * - `MockClassifier::working()` - Descending scores over the given labels
 * - `::failing()` variants - Always error
 */

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::engines::{Classifier, Transcriber, Translator};
use crate::errors::{TaggingError, TranscriptionError, TranslationError};
use crate::subtitle::{Segment, Transcript};

/// Behavior mode for the mock transcriber
#[derive(Debug, Clone)]
pub enum TranscriberBehavior {
    /// Returns the canned segments with the given detected language
    Working { language: String },
    /// Returns caller-supplied segments with the given detected language
    WithSegments { language: String, segments: Vec<Segment> },
    /// Always fails with an engine error
    Failing,
    /// Reports an empty transcript
    Empty,
}

/// Mock speech-recognition engine
#[derive(Debug)]
pub struct MockTranscriber {
    /// Behavior mode
    behavior: TranscriberBehavior,
    /// Number of transcribe calls, shared across clones
    call_count: Arc<AtomicUsize>,
}

impl MockTranscriber {
    pub fn new(behavior: TranscriberBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Canned three-segment transcript detected as `language`
    pub fn working(language: &str) -> Self {
        Self::new(TranscriberBehavior::Working { language: language.to_string() })
    }

    /// Caller-supplied segments detected as `language`
    pub fn with_segments(language: &str, segments: Vec<Segment>) -> Self {
        Self::new(TranscriberBehavior::WithSegments {
            language: language.to_string(),
            segments,
        })
    }

    pub fn failing() -> Self {
        Self::new(TranscriberBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(TranscriberBehavior::Empty)
    }

    /// Number of transcribe calls so far
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Shared-counter handle for asserting call counts after moving the
    /// mock into an engine set
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }

    /// The canned segments used by `working()`
    pub fn canned_segments() -> Vec<Segment> {
        vec![
            Segment::new(0, 0, 2_000, "First segment".to_string()),
            Segment::new(1, 2_000, 5_000, "Second segment".to_string()),
            Segment::new(2, 5_000, 9_500, "Third segment".to_string()),
        ]
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        media_path: &Path,
        forced_language: Option<&str>,
    ) -> Result<Transcript, TranscriptionError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            TranscriberBehavior::Working { language } => Ok(Transcript {
                source_language: forced_language.unwrap_or(language).to_string(),
                segments: Self::canned_segments(),
            }),
            TranscriberBehavior::WithSegments { language, segments } => Ok(Transcript {
                source_language: forced_language.unwrap_or(language).to_string(),
                segments: segments.clone(),
            }),
            TranscriberBehavior::Failing => Err(TranscriptionError::EngineFailed(
                "Simulated transcription failure".to_string(),
            )),
            TranscriberBehavior::Empty => Err(TranscriptionError::EmptyTranscript {
                media: media_path.display().to_string(),
            }),
        }
    }
}

/// Behavior mode for the mock translator
#[derive(Debug, Clone)]
pub enum TranslatorBehavior {
    /// Translates each text to "[lang] text"
    Working,
    /// Always fails with an engine error
    Failing,
    /// Fails only for the listed target languages
    FailLanguages(Vec<String>),
    /// Returns one fewer text than it was given
    CountMismatch,
}

/// Mock translation engine
#[derive(Debug)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: TranslatorBehavior,
    /// Number of batch calls, shared across clones
    call_count: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new(behavior: TranslatorBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(TranslatorBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(TranslatorBehavior::Failing)
    }

    /// Fails only for the given target languages
    pub fn failing_for(languages: &[&str]) -> Self {
        Self::new(TranslatorBehavior::FailLanguages(
            languages.iter().map(|l| l.to_string()).collect(),
        ))
    }

    pub fn count_mismatch() -> Self {
        Self::new(TranslatorBehavior::CountMismatch)
    }

    /// Number of batch calls so far
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Shared-counter handle
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }

    /// The deterministic translation of one text
    pub fn translated(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, TranslationError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            TranslatorBehavior::Working => Ok(texts
                .iter()
                .map(|t| Self::translated(t, target_language))
                .collect()),
            TranslatorBehavior::Failing => Err(TranslationError::EngineFailed(
                "Simulated translation failure".to_string(),
            )),
            TranslatorBehavior::FailLanguages(languages) => {
                if languages.iter().any(|l| l == target_language) {
                    Err(TranslationError::EngineFailed(format!(
                        "Simulated failure for language {}",
                        target_language
                    )))
                } else {
                    Ok(texts
                        .iter()
                        .map(|t| Self::translated(t, target_language))
                        .collect())
                }
            }
            TranslatorBehavior::CountMismatch => {
                let mut out: Vec<String> = texts
                    .iter()
                    .map(|t| Self::translated(t, target_language))
                    .collect();
                out.pop();
                Ok(out)
            }
        }
    }
}

/// Behavior mode for the mock classifier
#[derive(Debug, Clone)]
pub enum ClassifierBehavior {
    /// Scores labels in declaration order: 0.9, 0.8, 0.7, ...
    Working,
    /// Uses caller-supplied (label, score) pairs
    WithScores(Vec<(String, f64)>),
    /// Always fails with an engine error
    Failing,
}

/// Mock classification engine
#[derive(Debug)]
pub struct MockClassifier {
    /// Behavior mode
    behavior: ClassifierBehavior,
}

impl MockClassifier {
    pub fn new(behavior: ClassifierBehavior) -> Self {
        Self { behavior }
    }

    pub fn working() -> Self {
        Self::new(ClassifierBehavior::Working)
    }

    pub fn with_scores(scores: Vec<(String, f64)>) -> Self {
        Self::new(ClassifierBehavior::WithScores(scores))
    }

    pub fn failing() -> Self {
        Self::new(ClassifierBehavior::Failing)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<(String, f64)>, TaggingError> {
        if text.trim().is_empty() {
            return Err(TaggingError::EmptyInput);
        }

        match &self.behavior {
            ClassifierBehavior::Working => Ok(labels
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    let score = (0.9 - 0.1 * i as f64).max(0.05);
                    (label.clone(), score)
                })
                .collect()),
            ClassifierBehavior::WithScores(scores) => Ok(scores.clone()),
            ClassifierBehavior::Failing => Err(TaggingError::EngineFailed(
                "Simulated classification failure".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_workingTranscriber_shouldReturnCannedSegments() {
        let transcriber = MockTranscriber::working("en");
        let transcript = transcriber
            .transcribe(&PathBuf::from("/tmp/video.mp4"), None)
            .await
            .unwrap();

        assert_eq!(transcript.source_language, "en");
        assert_eq!(transcript.segments.len(), 3);
        assert_eq!(transcriber.calls(), 1);
    }

    #[tokio::test]
    async fn test_transcriber_withForcedLanguage_shouldOverrideDetection() {
        let transcriber = MockTranscriber::working("sw");
        let transcript = transcriber
            .transcribe(&PathBuf::from("/tmp/video.mp4"), Some("en"))
            .await
            .unwrap();

        assert_eq!(transcript.source_language, "en");
    }

    #[tokio::test]
    async fn test_failingForTranslator_shouldOnlyFailListedLanguages() {
        let translator = MockTranslator::failing_for(&["es"]);
        let texts = vec!["hello".to_string()];

        assert!(translator.translate_batch(&texts, "en", "es").await.is_err());
        let fr = translator.translate_batch(&texts, "en", "fr").await.unwrap();
        assert_eq!(fr, vec!["[fr] hello".to_string()]);
    }

    #[tokio::test]
    async fn test_countMismatchTranslator_shouldDropOneText() {
        let translator = MockTranslator::count_mismatch();
        let texts = vec!["a".to_string(), "b".to_string()];

        let out = translator.translate_batch(&texts, "en", "de").await.unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn test_workingClassifier_shouldScoreDescending() {
        let classifier = MockClassifier::working();
        let labels = vec!["music".to_string(), "news".to_string(), "gaming".to_string()];

        let ranked = classifier.classify("some text", &labels).await.unwrap();
        assert_eq!(ranked[0], ("music".to_string(), 0.9));
        assert!(ranked[0].1 > ranked[1].1 && ranked[1].1 > ranked[2].1);
    }

    #[tokio::test]
    async fn test_classifier_withEmptyText_shouldFail() {
        let classifier = MockClassifier::working();
        let result = classifier.classify("  ", &["a".to_string()]).await;
        assert!(matches!(result, Err(TaggingError::EmptyInput)));
    }
}
