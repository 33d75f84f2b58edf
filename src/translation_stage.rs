/*!
 * Translation stage: turns a source transcript into per-language
 * translated transcripts.
 *
 * Only segment text ever crosses the engine boundary. Texts are extracted
 * in index order, sent in batches, and the translated strings are zipped
 * back onto the original (index, start_ms, end_ms) triples, so timestamps
 * are unchanged by construction.
 */

use std::sync::Arc;

use log::debug;

use crate::engines::Translator;
use crate::errors::TranslationError;
use crate::subtitle::{Segment, TranslatedTranscript, Transcript};

/// Batched translation over a [`Translator`] engine
#[derive(Debug, Clone)]
pub struct TranslationStage {
    translator: Arc<dyn Translator>,
    batch_size: usize,
}

impl TranslationStage {
    pub fn new(translator: Arc<dyn Translator>, batch_size: usize) -> Self {
        Self {
            translator,
            batch_size: batch_size.max(1),
        }
    }

    /// Translate a transcript into one target language.
    ///
    /// When the target equals the detected source language the original
    /// text is reused without calling the engine.
    pub async fn translate(
        &self,
        transcript: &Transcript,
        target_language: &str,
    ) -> Result<TranslatedTranscript, TranslationError> {
        if target_language == transcript.source_language {
            debug!("Target {} matches source, reusing original text", target_language);
            return Ok(TranslatedTranscript {
                language: target_language.to_string(),
                segments: transcript.segments.clone(),
            });
        }

        let texts: Vec<String> = transcript.segments.iter().map(|s| s.text.clone()).collect();

        let mut translated_texts: Vec<String> = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let out = self
                .translator
                .translate_batch(chunk, &transcript.source_language, target_language)
                .await?;

            if out.len() != chunk.len() {
                return Err(TranslationError::SegmentCountMismatch {
                    sent: chunk.len(),
                    received: out.len(),
                });
            }

            translated_texts.extend(out);
        }

        // Zip translated text onto the original timing, index-wise
        let segments: Vec<Segment> = transcript
            .segments
            .iter()
            .zip(translated_texts)
            .map(|(original, text)| {
                Segment::new(original.index, original.start_ms, original.end_ms, text)
            })
            .collect();

        Ok(TranslatedTranscript {
            language: target_language.to_string(),
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::mock::MockTranslator;

    fn transcript(segment_count: usize) -> Transcript {
        Transcript {
            source_language: "en".to_string(),
            segments: (0..segment_count)
                .map(|i| {
                    Segment::new(
                        i,
                        i as u64 * 1_000,
                        i as u64 * 1_000 + 900,
                        format!("text {}", i),
                    )
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_translate_shouldPreserveTimestampsExactly() {
        let stage = TranslationStage::new(Arc::new(MockTranslator::working()), 8);
        let source = transcript(5);

        let translated = stage.translate(&source, "es").await.unwrap();

        assert_eq!(translated.language, "es");
        assert_eq!(translated.segments.len(), source.segments.len());
        for (original, out) in source.segments.iter().zip(translated.segments.iter()) {
            assert_eq!(out.index, original.index);
            assert_eq!(out.start_ms, original.start_ms);
            assert_eq!(out.end_ms, original.end_ms);
            assert_eq!(out.text, format!("[es] {}", original.text));
        }
    }

    #[tokio::test]
    async fn test_translate_shouldBatchBySize() {
        let translator = Arc::new(MockTranslator::working());
        let counter = translator.call_counter();
        let stage = TranslationStage::new(translator, 8);

        // 20 segments with batch size 8 means 3 engine calls
        stage.translate(&transcript(20), "fr").await.unwrap();
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_translate_withSameLanguage_shouldSkipEngine() {
        let translator = Arc::new(MockTranslator::working());
        let counter = translator.call_counter();
        let stage = TranslationStage::new(translator, 8);
        let source = transcript(3);

        let translated = stage.translate(&source, "en").await.unwrap();

        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(translated.segments, source.segments);
    }

    #[tokio::test]
    async fn test_translate_withCountMismatch_shouldFail() {
        let stage = TranslationStage::new(Arc::new(MockTranslator::count_mismatch()), 8);

        let err = stage.translate(&transcript(4), "de").await.unwrap_err();
        match err {
            TranslationError::SegmentCountMismatch { sent, received } => {
                assert_eq!(sent, 4);
                assert_eq!(received, 3);
            }
            other => panic!("Expected SegmentCountMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_translate_withFailingEngine_shouldPropagate() {
        let stage = TranslationStage::new(Arc::new(MockTranslator::failing()), 8);
        assert!(stage.translate(&transcript(2), "es").await.is_err());
    }
}
