/*!
 * Work selection against a store populated by real pipeline runs.
 */

use anyhow::Result;

use polysub::database::VideoRef;
use polysub::pipeline::Coordinator;
use polysub::work_selector::{SelectionOptions, WorkSelector};

use crate::common;

const CID: &str = "QmSelectionTest";

async fn completed_run() -> Result<(polysub::database::Repository, tempfile::TempDir)> {
    let mut gateway = mockito::Server::new_async().await;
    let _media_mock = gateway
        .mock("GET", "/QmSelectionTest")
        .with_status(200)
        .with_body("fake-mp4-bytes")
        .create_async()
        .await;

    let output_dir = common::create_temp_dir()?;
    let config = common::test_config(&gateway.url(), output_dir.path());
    let repo = common::seeded_repository("alice", "intro", CID).await?;

    let coordinator = Coordinator::new(config, common::working_engines("en"), repo.clone())?;
    let summary = coordinator.run(&SelectionOptions::default()).await?;
    assert_eq!(summary.completed, 1);

    Ok((repo, output_dir))
}

fn languages() -> Vec<String> {
    vec!["en".to_string(), "es".to_string(), "fr".to_string()]
}

#[tokio::test]
async fn test_select_afterCompletedRun_shouldFindNothing() -> Result<()> {
    let (repo, _output_dir) = completed_run().await?;

    let selector = WorkSelector::new(repo);
    let items = selector.select(&languages(), &SelectionOptions::default()).await?;

    assert!(items.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_select_afterCompletedRun_withForce_shouldReselectEverything() -> Result<()> {
    let (repo, _output_dir) = completed_run().await?;

    let selector = WorkSelector::new(repo);
    let options = SelectionOptions {
        force: true,
        only: Some(("alice".to_string(), "intro".to_string())),
        ..Default::default()
    };
    let items = selector.select(&languages(), &options).await?;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].pending_languages, languages());
    Ok(())
}

#[tokio::test]
async fn test_select_withNewerVideoAfterRun_shouldSelectIt() -> Result<()> {
    let (repo, _output_dir) = completed_run().await?;

    // Arrives after the processed one, so it is past the cursor
    repo.insert_video(&VideoRef::new("bob", "fresh", "QmFresh", "2026-02-01T00:00:00Z"))
        .await?;

    let selector = WorkSelector::new(repo);
    let items = selector.select(&languages(), &SelectionOptions::default()).await?;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].video.author, "bob");
    assert_eq!(items[0].pending_languages, languages());
    Ok(())
}

#[tokio::test]
async fn test_select_withNewLanguageAddedAfterRun_shouldWantOnlyThatLanguage() -> Result<()> {
    let (repo, _output_dir) = completed_run().await?;

    let mut extended = languages();
    extended.push("de".to_string());

    let selector = WorkSelector::new(repo);
    let options = SelectionOptions {
        only: Some(("alice".to_string(), "intro".to_string())),
        ..Default::default()
    };
    let items = selector.select(&extended, &options).await?;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].pending_languages, vec!["de".to_string()]);
    Ok(())
}
