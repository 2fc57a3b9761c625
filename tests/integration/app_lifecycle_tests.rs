/*!
 * Integration tests for the application controller lifecycle
 */

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use dataset_translator::app_controller::Controller;
use dataset_translator::dataset::Sample;
use dataset_translator::providers::mock::MockProvider;
use dataset_translator::translation::StopReason;

use crate::common::{
    StaticSource, UnreachableSource, create_temp_dir, ms_marco_sample, read_jsonl, test_config,
    write_source_cache,
};

fn upper() -> MockProvider {
    MockProvider::working().with_custom_response(|text| text.to_uppercase())
}

fn no_interrupt() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

/// Two runs over the same dataset download once and continue where the first stopped
#[tokio::test]
async fn test_runWith_twice_shouldDownloadOnceAndResume() -> Result<()> {
    let dir = create_temp_dir()?;
    let samples: Vec<Sample> = (0..5).map(ms_marco_sample).collect();
    let source = Arc::new(StaticSource::new(samples));
    let provider = upper();
    let controller = Controller::with_config(test_config(dir.path()))?;

    let first = controller
        .run_with("ms_marco", 2, Arc::new(provider.clone()), source.clone(), no_interrupt())
        .await?;
    let second = controller
        .run_with("ms_marco", 10, Arc::new(provider.clone()), source.clone(), no_interrupt())
        .await?;

    assert_eq!(source.calls(), 1);
    assert_eq!((first.start_cursor, first.end_cursor), (0, 2));
    assert_eq!(first.stop_reason, StopReason::BudgetExhausted);
    assert_eq!((second.start_cursor, second.end_cursor), (2, 5));
    assert_eq!(second.stop_reason, StopReason::DatasetExhausted);
    assert_eq!(
        first.output_path,
        dir.path().join("dutch").join("ms_marco").join("ms_marco_dutch.jsonl")
    );

    let records = read_jsonl(&second.output_path)?;
    assert_eq!(records.len(), 5);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record["query_id"], json!(i));
    }
    Ok(())
}

/// The default prompt template reaches the provider with the language names filled in
#[tokio::test]
async fn test_runWith_shouldSendConfiguredPrompt() -> Result<()> {
    let dir = create_temp_dir()?;
    let source = Arc::new(StaticSource::new(vec![ms_marco_sample(0)]));
    let provider = MockProvider::working();
    let mut config = test_config(dir.path());
    config.target_language = "de".to_string();
    let controller = Controller::with_config(config)?;

    let report = controller
        .run_with("ms_marco", 1, Arc::new(provider.clone()), source, no_interrupt())
        .await?;

    assert!(provider.requests().iter().all(|r| r.contains("German")));
    assert!(provider.requests().iter().any(|r| r.ends_with("query 0")));
    assert!(report.output_path.ends_with("german/ms_marco/ms_marco_german.jsonl"));
    Ok(())
}

/// Unknown dataset names are rejected with the supported names listed
#[tokio::test]
async fn test_runWith_withUnsupportedDataset_shouldListSupportedNames() -> Result<()> {
    let dir = create_temp_dir()?;
    let controller = Controller::with_config(test_config(dir.path()))?;

    let err = controller
        .run_with("squad", 1, Arc::new(upper()), Arc::new(UnreachableSource), no_interrupt())
        .await
        .expect_err("unsupported dataset should fail");

    let message = err.to_string();
    assert!(message.contains("squad"), "unexpected message: {}", message);
    assert!(message.contains("ms_marco"), "unexpected message: {}", message);
    assert!(message.contains("quora"), "unexpected message: {}", message);
    Ok(())
}

/// Dataset statuses reflect the cache and output on disk
#[tokio::test]
async fn test_datasetStatuses_shouldReportCacheAndProgress() -> Result<()> {
    let dir = create_temp_dir()?;
    let controller = Controller::with_config(test_config(dir.path()))?;

    let before = controller.dataset_statuses()?;
    assert!(before.iter().all(|s| s.cached_samples.is_none() && s.translated_samples == 0));

    write_source_cache(dir.path(), "ms_marco", &(0..4).map(ms_marco_sample).collect::<Vec<_>>())?;
    controller
        .run_with("ms_marco", 3, Arc::new(upper()), Arc::new(UnreachableSource), no_interrupt())
        .await?;

    let after = controller.dataset_statuses()?;
    let ms_marco = after.iter().find(|s| s.name == "ms_marco").expect("ms_marco listed");
    assert_eq!(ms_marco.cached_samples, Some(4));
    assert_eq!(ms_marco.translated_samples, 3);
    assert_eq!(ms_marco.huggingface_path, "microsoft/ms_marco");
    let quora = after.iter().find(|s| s.name == "quora").expect("quora listed");
    assert_eq!(quora.cached_samples, None);
    Ok(())
}

/// Pushing is accepted but uploads nothing
#[test]
fn test_pushToHub_shouldSucceedWithoutUploading() -> Result<()> {
    let dir = create_temp_dir()?;
    let controller = Controller::with_config(test_config(dir.path()))?;

    controller.push_to_hub("ms_marco")?;

    assert!(!dir.path().join("dutch").exists());
    Ok(())
}

/// An interrupted run is not pushed; a finished one is
#[tokio::test]
async fn test_pushAfter_withInterruptedRun_shouldSkipPush() -> Result<()> {
    let dir = create_temp_dir()?;
    let source = Arc::new(StaticSource::new((0..3).map(ms_marco_sample).collect()));
    let controller = Controller::with_config(test_config(dir.path()))?;

    let interrupted = controller
        .run_with("ms_marco", 3, Arc::new(upper()), source.clone(), Arc::new(AtomicBool::new(true)))
        .await?;
    assert_eq!(interrupted.stop_reason, StopReason::Interrupted);
    assert!(!controller.push_after(&interrupted)?);

    let finished = controller
        .run_with("ms_marco", 3, Arc::new(upper()), source, no_interrupt())
        .await?;
    assert_eq!(finished.stop_reason, StopReason::BudgetExhausted);
    assert!(controller.push_after(&finished)?);
    Ok(())
}
