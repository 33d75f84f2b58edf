/*!
 * End-to-end pipeline tests.
 *
 * Media is served by a mock HTTP gateway and the inference engines are
 * the deterministic mocks, so every run exercises the real coordinator,
 * fetcher, translation stage, tagging service, and metadata store.
 */

use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Result;

use polysub::database::{Repository, VideoRef, VideoType};
use polysub::engines::EngineSet;
use polysub::engines::mock::{MockClassifier, MockTranscriber, MockTranslator};
use polysub::pipeline::Coordinator;
use polysub::subtitle::Segment;
use polysub::work_selector::SelectionOptions;

use crate::common;

const CID: &str = "QmIntegrationTest";

#[tokio::test]
async fn test_run_withEverythingWorking_shouldCompleteAllLanguages() -> Result<()> {
    let mut gateway = mockito::Server::new_async().await;
    let media_mock = gateway
        .mock("GET", "/QmIntegrationTest")
        .with_status(200)
        .with_body("fake-mp4-bytes")
        .create_async()
        .await;

    let output_dir = common::create_temp_dir()?;
    let config = common::test_config(&gateway.url(), output_dir.path());
    let repo = common::seeded_repository("alice", "intro", CID).await?;

    let coordinator = Coordinator::new(config, common::working_engines("en"), repo.clone())?;
    let summary = coordinator.run(&SelectionOptions::default()).await?;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 0);

    // One SRT file per language, under author/permlink.lang.srt
    for lang in ["en", "es", "fr"] {
        let path = output_dir.path().join(format!("alice/intro.{}.srt", lang));
        assert!(path.exists(), "Missing subtitle file for {}", lang);
    }

    // The source language is passed through untranslated
    let en = std::fs::read_to_string(output_dir.path().join("alice/intro.en.srt"))?;
    assert!(en.contains("First segment"));
    let es = std::fs::read_to_string(output_dir.path().join("alice/intro.es.srt"))?;
    assert!(es.contains("[es] First segment"));

    // Durable per-language records plus a tag record
    let languages = repo.existing_subtitle_languages("alice", "intro").await?;
    assert_eq!(languages, vec!["en", "es", "fr"]);

    let tags = repo.get_tag_record("alice", "intro").await?.unwrap();
    assert_eq!(tags.tag_list().len(), 5);
    assert!(tags.tag_list().contains(&"gaming"));

    media_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_run_withOneLanguageFailing_shouldIsolateTheFailure() -> Result<()> {
    let mut gateway = mockito::Server::new_async().await;
    let _media_mock = gateway
        .mock("GET", "/QmIntegrationTest")
        .with_status(200)
        .with_body("fake-mp4-bytes")
        .create_async()
        .await;

    let output_dir = common::create_temp_dir()?;
    let config = common::test_config(&gateway.url(), output_dir.path());
    let repo = common::seeded_repository("alice", "intro", CID).await?;

    let engines = EngineSet {
        transcriber: Arc::new(MockTranscriber::working("en")),
        translator: Arc::new(MockTranslator::failing_for(&["es"])),
        classifier: Arc::new(MockClassifier::working()),
    };

    let coordinator = Coordinator::new(config, engines, repo.clone())?;
    let summary = coordinator.run(&SelectionOptions::default()).await?;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.partial, 1);

    // The failed language leaves no file and no record; siblings are intact
    let languages = repo.existing_subtitle_languages("alice", "intro").await?;
    assert_eq!(languages, vec!["en", "fr"]);
    assert!(!output_dir.path().join("alice/intro.es.srt").exists());
    assert!(output_dir.path().join("alice/intro.fr.srt").exists());

    Ok(())
}

#[tokio::test]
async fn test_run_afterCompletedRun_shouldDoNothing() -> Result<()> {
    let mut gateway = mockito::Server::new_async().await;
    // Exactly one download across both runs
    let media_mock = gateway
        .mock("GET", "/QmIntegrationTest")
        .with_status(200)
        .with_body("fake-mp4-bytes")
        .expect(1)
        .create_async()
        .await;

    let output_dir = common::create_temp_dir()?;
    let config = common::test_config(&gateway.url(), output_dir.path());
    let repo = common::seeded_repository("alice", "intro", CID).await?;

    let coordinator = Coordinator::new(config, common::working_engines("en"), repo)?;

    let first = coordinator.run(&SelectionOptions::default()).await?;
    assert_eq!(first.completed, 1);

    let second = coordinator.run(&SelectionOptions::default()).await?;
    assert_eq!(second.processed, 0);

    media_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_run_withForce_shouldReprocessWithoutDuplicateRecords() -> Result<()> {
    let mut gateway = mockito::Server::new_async().await;
    let media_mock = gateway
        .mock("GET", "/QmIntegrationTest")
        .with_status(200)
        .with_body("fake-mp4-bytes")
        .expect(2)
        .create_async()
        .await;

    let output_dir = common::create_temp_dir()?;
    let config = common::test_config(&gateway.url(), output_dir.path());
    let repo = common::seeded_repository("alice", "intro", CID).await?;

    let coordinator = Coordinator::new(config, common::working_engines("en"), repo.clone())?;

    coordinator.run(&SelectionOptions::default()).await?;
    let forced = SelectionOptions {
        force: true,
        ..Default::default()
    };
    let summary = coordinator.run(&forced).await?;
    assert_eq!(summary.completed, 1);

    // Upserts keep exactly one record per (video, language)
    let records = repo.get_subtitle_records("alice", "intro").await?;
    assert_eq!(records.len(), 3);

    media_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_run_withUnavailableMedia_shouldFailTheVideo() -> Result<()> {
    let mut gateway = mockito::Server::new_async().await;
    let _media_mock = gateway
        .mock("GET", "/QmIntegrationTest")
        .with_status(404)
        .create_async()
        .await;

    let output_dir = common::create_temp_dir()?;
    let config = common::test_config(&gateway.url(), output_dir.path());
    let repo = common::seeded_repository("alice", "intro", CID).await?;

    let coordinator = Coordinator::new(config, common::working_engines("en"), repo.clone())?;
    let summary = coordinator.run(&SelectionOptions::default()).await?;

    assert_eq!(summary.failed, 1);
    assert!(repo.get_subtitle_records("alice", "intro").await?.is_empty());
    assert!(repo.get_tag_record("alice", "intro").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_run_withUnconfiguredDetectedLanguage_shouldRetranscribeAsEnglish() -> Result<()> {
    let mut gateway = mockito::Server::new_async().await;
    let _media_mock = gateway
        .mock("GET", "/QmIntegrationTest")
        .with_status(200)
        .with_body("fake-mp4-bytes")
        .create_async()
        .await;

    let output_dir = common::create_temp_dir()?;
    let config = common::test_config(&gateway.url(), output_dir.path());
    let repo = common::seeded_repository("alice", "intro", CID).await?;

    // Swahili is not in the configured en/es/fr set
    let transcriber = MockTranscriber::working("sw");
    let calls = transcriber.call_counter();
    let engines = EngineSet {
        transcriber: Arc::new(transcriber),
        translator: Arc::new(MockTranslator::working()),
        classifier: Arc::new(MockClassifier::working()),
    };

    let coordinator = Coordinator::new(config, engines, repo.clone())?;
    let summary = coordinator.run(&SelectionOptions::default()).await?;

    // One detection pass plus one forced-English pass
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(summary.completed, 1);
    let languages = repo.existing_subtitle_languages("alice", "intro").await?;
    assert_eq!(languages, vec!["en", "es", "fr"]);

    Ok(())
}

#[tokio::test]
async fn test_run_withVideoOverDurationThreshold_shouldSkipThatLanguage() -> Result<()> {
    let mut gateway = mockito::Server::new_async().await;
    let _media_mock = gateway
        .mock("GET", "/QmIntegrationTest")
        .with_status(200)
        .with_body("fake-mp4-bytes")
        .create_async()
        .await;

    let output_dir = common::create_temp_dir()?;
    let mut config = common::test_config(&gateway.url(), output_dir.path());
    // Spanish only for videos up to one minute
    config.languages[1].max_duration_min = 1;
    let repo = common::seeded_repository("alice", "intro", CID).await?;

    // Five minutes of speech
    let segments = vec![Segment::new(0, 0, 5 * 60_000, "A long monologue".to_string())];
    let engines = EngineSet {
        transcriber: Arc::new(MockTranscriber::with_segments("en", segments)),
        translator: Arc::new(MockTranslator::working()),
        classifier: Arc::new(MockClassifier::working()),
    };

    let coordinator = Coordinator::new(config, engines, repo.clone())?;
    let summary = coordinator.run(&SelectionOptions::default()).await?;

    // Skips are not failures
    assert_eq!(summary.completed, 1);
    let languages = repo.existing_subtitle_languages("alice", "intro").await?;
    assert_eq!(languages, vec!["en", "fr"]);
    assert!(!output_dir.path().join("alice/intro.es.srt").exists());

    Ok(())
}

#[tokio::test]
async fn test_run_withEmbedVideo_shouldFetchViaHlsManifest() -> Result<()> {
    let mut gateway = mockito::Server::new_async().await;
    let manifest = gateway
        .mock("GET", "/QmEmbed/manifest.m3u8")
        .with_status(200)
        .with_body("#EXTM3U\n#EXTINF:10.0,\nseg0.ts\n#EXT-X-ENDLIST\n")
        .create_async()
        .await;
    let segment = gateway
        .mock("GET", "/QmEmbed/seg0.ts")
        .with_status(200)
        .with_body("ts-bytes")
        .create_async()
        .await;

    let output_dir = common::create_temp_dir()?;
    let config = common::test_config(&gateway.url(), output_dir.path());
    let repo = Repository::new_in_memory()?;
    repo.insert_video(&VideoRef::with_type(
        "alice",
        "stream",
        "QmEmbed",
        "2026-01-15T12:00:00Z",
        VideoType::Embed,
    ))
    .await?;

    let coordinator = Coordinator::new(config, common::working_engines("en"), repo.clone())?;
    let summary = coordinator.run(&SelectionOptions::default()).await?;

    assert_eq!(summary.completed, 1);
    let languages = repo.existing_subtitle_languages("alice", "stream").await?;
    assert_eq!(languages, vec!["en", "es", "fr"]);

    manifest.assert_async().await;
    segment.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_run_shouldLeaveNoMediaBehindOnAnyOutcome() -> Result<()> {
    let mut gateway = mockito::Server::new_async().await;
    let _media_mock = gateway
        .mock("GET", "/QmIntegrationTest")
        .with_status(200)
        .with_body("fake-mp4-bytes")
        .expect_at_least(3)
        .create_async()
        .await;

    // One engine set per terminal state
    let scenarios: Vec<(EngineSet, &str)> = vec![
        (common::working_engines("en"), "completed"),
        (
            EngineSet {
                transcriber: Arc::new(MockTranscriber::working("en")),
                translator: Arc::new(MockTranslator::failing_for(&["es"])),
                classifier: Arc::new(MockClassifier::working()),
            },
            "partially completed",
        ),
        (
            EngineSet {
                transcriber: Arc::new(MockTranscriber::failing()),
                translator: Arc::new(MockTranslator::working()),
                classifier: Arc::new(MockClassifier::working()),
            },
            "failed",
        ),
    ];

    for (engines, label) in scenarios {
        let output_dir = common::create_temp_dir()?;
        let config = common::test_config(&gateway.url(), output_dir.path());
        let repo = common::seeded_repository("alice", "intro", CID).await?;

        let coordinator = Coordinator::new(config, engines, repo)?;
        let summary = coordinator.run(&SelectionOptions::default()).await?;
        assert_eq!(summary.processed, 1, "scenario {}", label);

        let staged = std::fs::read_dir(coordinator.media_temp_dir())?.count();
        assert_eq!(staged, 0, "media left behind after a {} run", label);
    }

    Ok(())
}

#[tokio::test]
async fn test_run_withTaggingFailure_shouldStillWriteSubtitles() -> Result<()> {
    let mut gateway = mockito::Server::new_async().await;
    let _media_mock = gateway
        .mock("GET", "/QmIntegrationTest")
        .with_status(200)
        .with_body("fake-mp4-bytes")
        .create_async()
        .await;

    let output_dir = common::create_temp_dir()?;
    let config = common::test_config(&gateway.url(), output_dir.path());
    let repo = common::seeded_repository("alice", "intro", CID).await?;

    let engines = EngineSet {
        transcriber: Arc::new(MockTranscriber::working("en")),
        translator: Arc::new(MockTranslator::working()),
        classifier: Arc::new(MockClassifier::failing()),
    };

    let coordinator = Coordinator::new(config, engines, repo.clone())?;
    let summary = coordinator.run(&SelectionOptions::default()).await?;

    // Subtitles survive a tagging failure; the video is only partial
    assert_eq!(summary.partial, 1);
    let languages = repo.existing_subtitle_languages("alice", "intro").await?;
    assert_eq!(languages, vec!["en", "es", "fr"]);
    assert!(repo.get_tag_record("alice", "intro").await?.is_none());

    Ok(())
}
