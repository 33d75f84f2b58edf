/*!
 * Tagging service: derives content tags from a transcript via zero-shot
 * classification against a configured vocabulary.
 */

use std::sync::Arc;

use log::debug;

use crate::app_config::TaggingConfig;
use crate::engines::Classifier;
use crate::errors::TaggingError;
use crate::subtitle::{TagResult, Transcript};

/// Vocabulary classification over a [`Classifier`] engine
#[derive(Debug, Clone)]
pub struct TaggingService {
    classifier: Arc<dyn Classifier>,
    vocabulary: Vec<String>,
    max_tags: usize,
    min_confidence: f64,
    sample_window_ms: u64,
}

impl TaggingService {
    pub fn new(classifier: Arc<dyn Classifier>, config: &TaggingConfig) -> Self {
        Self {
            classifier,
            vocabulary: config.vocabulary.clone(),
            max_tags: config.max_tags.max(1),
            min_confidence: config.min_confidence,
            sample_window_ms: config.sample_duration_secs * 1_000,
        }
    }

    /// Tag a transcript.
    ///
    /// Classifies text sampled from the start of the transcript, keeps up
    /// to `max_tags` labels scoring at or above `min_confidence`, and falls
    /// back to the single highest-scoring label so a successful
    /// classification always yields at least one tag.
    pub async fn tag(&self, transcript: &Transcript) -> Result<TagResult, TaggingError> {
        let sample = transcript.sample_text(self.sample_window_ms);
        if sample.trim().is_empty() {
            return Err(TaggingError::EmptyInput);
        }

        let ranked = self.classifier.classify(&sample, &self.vocabulary).await?;
        if ranked.is_empty() {
            return Err(TaggingError::EngineFailed(
                "Classifier returned no labels".to_string(),
            ));
        }

        let mut result = TagResult::default();
        for (label, score) in ranked.iter().take(self.max_tags) {
            if *score >= self.min_confidence {
                result.tags.push(label.clone());
                result.scores.push(*score);
            }
        }

        // Never return an empty tag set from a successful classification
        if result.tags.is_empty() {
            let (label, score) = &ranked[0];
            result.tags.push(label.clone());
            result.scores.push(*score);
        }

        debug!("Tagged as [{}]", result.joined());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::mock::MockClassifier;
    use crate::subtitle::Segment;

    fn config() -> TaggingConfig {
        TaggingConfig {
            vocabulary: vec!["music".to_string(), "news".to_string(), "gaming".to_string()],
            max_tags: 2,
            min_confidence: 0.3,
            sample_duration_secs: 60,
        }
    }

    fn transcript() -> Transcript {
        Transcript {
            source_language: "en".to_string(),
            segments: vec![
                Segment::new(0, 0, 5_000, "talking about guitars".to_string()),
                Segment::new(1, 5_000, 10_000, "and drum machines".to_string()),
                Segment::new(2, 120_000, 125_000, "outside the sample window".to_string()),
            ],
        }
    }

    #[tokio::test]
    async fn test_tag_shouldFilterByConfidenceAndCap() {
        let classifier = Arc::new(MockClassifier::with_scores(vec![
            ("music".to_string(), 0.8),
            ("gaming".to_string(), 0.5),
            ("news".to_string(), 0.4),
        ]));
        let service = TaggingService::new(classifier, &config());

        let result = service.tag(&transcript()).await.unwrap();

        // max_tags = 2 caps the result even though three labels pass
        assert_eq!(result.tags, vec!["music".to_string(), "gaming".to_string()]);
        assert_eq!(result.joined(), "music,gaming");
    }

    #[tokio::test]
    async fn test_tag_withAllScoresBelowThreshold_shouldKeepBestLabel() {
        let classifier = Arc::new(MockClassifier::with_scores(vec![
            ("news".to_string(), 0.2),
            ("music".to_string(), 0.1),
        ]));
        let service = TaggingService::new(classifier, &config());

        let result = service.tag(&transcript()).await.unwrap();

        assert_eq!(result.tags, vec!["news".to_string()]);
        assert_eq!(result.scores, vec![0.2]);
    }

    #[tokio::test]
    async fn test_tag_withFailingClassifier_shouldPropagate() {
        let service = TaggingService::new(Arc::new(MockClassifier::failing()), &config());
        assert!(service.tag(&transcript()).await.is_err());
    }

    #[tokio::test]
    async fn test_tag_withEmptyTranscript_shouldFailBeforeEngine() {
        let service = TaggingService::new(Arc::new(MockClassifier::working()), &config());
        let empty = Transcript {
            source_language: "en".to_string(),
            segments: vec![],
        };

        assert!(matches!(service.tag(&empty).await, Err(TaggingError::EmptyInput)));
    }
}
