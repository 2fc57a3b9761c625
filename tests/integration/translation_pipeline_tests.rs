/*!
 * Integration tests for the resumable batch pipeline.
 *
 * Every test runs against a temporary data directory with an in-memory dataset
 * source and the mock provider, so no network is involved.
 */

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dataset_translator::Config;
use dataset_translator::dataset::{DatasetInfo, DatasetRegistry, DatasetSource, Sample, SampleStore};
use dataset_translator::errors::{DatasetError, PipelineError};
use dataset_translator::providers::mock::MockProvider;
use dataset_translator::translation::{BatchPipeline, StopReason, TextTranslator};

use crate::common::{
    StaticSource, create_temp_dir, create_test_file, init_logger, ms_marco_sample, quora_sample,
    read_jsonl, sample, write_source_cache,
};

fn pipeline(data_dir: &Path, source: Arc<dyn DatasetSource>, provider: MockProvider) -> BatchPipeline {
    let mut config = Config::default();
    config.translation.common.user_prompt = "{text}".to_string();
    let translator = TextTranslator::new(Arc::new(provider), &config).unwrap();
    BatchPipeline::new(SampleStore::new(data_dir.join("english"), source), translator)
}

fn upper() -> MockProvider {
    MockProvider::working().with_custom_response(|text| text.to_uppercase())
}

fn output_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join("dutch").join(name).join(format!("{}_dutch.jsonl", name))
}

fn info(name: &str) -> &'static DatasetInfo {
    DatasetRegistry::get(name).unwrap()
}

/// Resuming after 3 records with a budget of 5 appends exactly records 4 to 8
#[tokio::test]
async fn test_run_withThreeExistingRecords_shouldAppendFiveMore() {
    init_logger();
    let dir = create_temp_dir().unwrap();
    let samples: Vec<Sample> = (0..10).map(quora_sample).collect();
    let source = Arc::new(StaticSource::new(samples));
    let output = output_path(dir.path(), "quora");
    let prefix = "{\"_id\":\"0\",\"title\":\"\",\"text\":\"VRAAG 0\"}\n\
                  {\"_id\":\"1\",\"title\":\"\",\"text\":\"VRAAG 1\"}\n\
                  {\"_id\":\"2\",\"title\":\"\",\"text\":\"VRAAG 2\"}\n";
    fs::create_dir_all(output.parent().unwrap()).unwrap();
    fs::write(&output, prefix).unwrap();
    let provider = upper();

    let report = pipeline(dir.path(), source.clone(), provider.clone())
        .run(info("quora"), &output, 5)
        .await
        .unwrap();

    assert_eq!(report.start_cursor, 3);
    assert_eq!(report.end_cursor, 8);
    assert_eq!(report.translated, 5);
    assert_eq!(report.stop_reason, StopReason::BudgetExhausted);

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.starts_with(prefix));
    let records = read_jsonl(&output).unwrap();
    assert_eq!(records.len(), 8);
    for (i, record) in records.iter().enumerate().skip(3) {
        assert_eq!(record["_id"], json!(i.to_string()));
        assert_eq!(record["text"], json!(format!("QUESTION {}", i)));
    }
    assert_eq!(provider.request_count(), 5);
    assert!(!provider.requests().iter().any(|r| r == "question 0" || r == "question 2"));
}

/// A failing text keeps its original value and the run carries on
#[tokio::test]
async fn test_run_withFailureOnHello_shouldKeepHelloAndContinue() {
    let dir = create_temp_dir().unwrap();
    let samples = vec![
        sample(json!({"_id": "a", "title": "greeting", "text": "hello"})),
        sample(json!({"_id": "b", "title": "farewell", "text": "goodbye"})),
    ];
    let source = Arc::new(StaticSource::new(samples));
    let output = output_path(dir.path(), "quora");
    let provider = MockProvider::failing_on("hello").with_custom_response(|text| text.to_uppercase());

    let report = pipeline(dir.path(), source, provider)
        .run(info("quora"), &output, 10)
        .await
        .unwrap();

    assert_eq!(report.translated, 2);
    assert_eq!(report.failed_fields, 1);
    assert_eq!(report.stop_reason, StopReason::DatasetExhausted);
    let records = read_jsonl(&output).unwrap();
    assert_eq!(records[0], json!({"_id": "a", "title": "GREETING", "text": "hello"}));
    assert_eq!(records[1], json!({"_id": "b", "title": "FAREWELL", "text": "GOODBYE"}));
}

/// With every request failing, output records equal their source samples
#[tokio::test]
async fn test_run_withAlwaysFailingProvider_shouldWriteOriginalRecords() {
    let dir = create_temp_dir().unwrap();
    let samples: Vec<Sample> = (0..3).map(ms_marco_sample).collect();
    let source = Arc::new(StaticSource::new(samples.clone()));
    let output = output_path(dir.path(), "ms_marco");

    let report = pipeline(dir.path(), source, MockProvider::failing())
        .run(info("ms_marco"), &output, 3)
        .await
        .unwrap();

    assert_eq!(report.failed_fields, 12);
    let lines: Vec<String> = fs::read_to_string(&output).unwrap().lines().map(String::from).collect();
    let expected: Vec<String> = samples.iter().map(|s| serde_json::to_string(s).unwrap()).collect();
    assert_eq!(lines, expected);
}

/// Passage lists keep their length and order through translation
#[tokio::test]
async fn test_run_withPassages_shouldAlignTranslatedLists() {
    let dir = create_temp_dir().unwrap();
    let source = Arc::new(StaticSource::new(vec![ms_marco_sample(4)]));
    let output = output_path(dir.path(), "ms_marco");

    pipeline(dir.path(), source, upper())
        .run(info("ms_marco"), &output, 1)
        .await
        .unwrap();

    let records = read_jsonl(&output).unwrap();
    assert_eq!(
        records[0]["passages"],
        json!({
            "is_selected": [0, 1],
            "passage_text": ["FIRST PASSAGE 4", "SECOND PASSAGE 4"],
            "url": ["https://example.com/4/a", "https://example.com/4/b"]
        })
    );
    assert_eq!(records[0]["query_id"], json!(4));
    assert_eq!(records[0]["query"], json!("QUERY 4"));
}

/// A truncated record left by a crash is replaced, not counted
#[tokio::test]
async fn test_run_withTruncatedTail_shouldRewriteThatSample() {
    let dir = create_temp_dir().unwrap();
    let samples: Vec<Sample> = (0..4).map(quora_sample).collect();
    let source = Arc::new(StaticSource::new(samples));
    let output = output_path(dir.path(), "quora");
    fs::create_dir_all(output.parent().unwrap()).unwrap();
    fs::write(&output, "{\"_id\":\"0\",\"title\":\"\",\"text\":\"QUESTION 0\"}\n{\"_id\":\"1\",\"ti").unwrap();

    let report = pipeline(dir.path(), source, upper())
        .run(info("quora"), &output, 2)
        .await
        .unwrap();

    assert_eq!(report.start_cursor, 1);
    let records = read_jsonl(&output).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1]["_id"], json!("1"));
    assert_eq!(records[2]["_id"], json!("2"));
}

/// Re-running after completion translates nothing and touches nothing
#[tokio::test]
async fn test_run_whenDatasetComplete_shouldBeNoOp() {
    let dir = create_temp_dir().unwrap();
    let source = Arc::new(StaticSource::new((0..2).map(quora_sample).collect()));
    let output = output_path(dir.path(), "quora");
    let provider = upper();
    let pipeline = pipeline(dir.path(), source.clone(), provider.clone());

    pipeline.run(info("quora"), &output, 10).await.unwrap();
    let before = fs::read(&output).unwrap();
    let report = pipeline.run(info("quora"), &output, 10).await.unwrap();

    assert_eq!(report.translated, 0);
    assert_eq!(report.stop_reason, StopReason::DatasetExhausted);
    assert_eq!(fs::read(&output).unwrap(), before);
    assert_eq!(provider.request_count(), 2);
    assert_eq!(source.calls(), 1);
}

/// A zero budget does nothing and counts as exhausted
#[tokio::test]
async fn test_run_withZeroBudget_shouldNotCreateOutput() {
    let dir = create_temp_dir().unwrap();
    let source = Arc::new(StaticSource::new((0..2).map(quora_sample).collect()));
    let output = output_path(dir.path(), "quora");

    let report = pipeline(dir.path(), source, upper())
        .run(info("quora"), &output, 0)
        .await
        .unwrap();

    assert_eq!(report.translated, 0);
    assert_eq!(report.stop_reason, StopReason::BudgetExhausted);
    assert!(!output.exists());
}

/// Raising the interrupt flag stops before the next sample
#[tokio::test]
async fn test_run_withInterrupt_shouldStopAfterCurrentSample() {
    let dir = create_temp_dir().unwrap();
    let source = Arc::new(StaticSource::new((0..5).map(quora_sample).collect()));
    let output = output_path(dir.path(), "quora");
    let flag = Arc::new(AtomicBool::new(false));
    let trigger = Arc::clone(&flag);

    let report = pipeline(dir.path(), source, upper())
        .with_interrupt(flag)
        .with_progress(move |done, _| {
            if done == 2 {
                trigger.store(true, Ordering::SeqCst);
            }
        })
        .run(info("quora"), &output, 5)
        .await
        .unwrap();

    assert_eq!(report.translated, 2);
    assert_eq!(report.stop_reason, StopReason::Interrupted);
    assert_eq!(read_jsonl(&output).unwrap().len(), 2);
}

/// An output longer than the dataset is refused
#[tokio::test]
async fn test_run_withCursorBeyondDataset_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let source = Arc::new(StaticSource::new(vec![quora_sample(0)]));
    let output = output_path(dir.path(), "quora");
    fs::create_dir_all(output.parent().unwrap()).unwrap();
    fs::write(&output, "{}\n{}\n").unwrap();

    let err = pipeline(dir.path(), source, upper())
        .run(info("quora"), &output, 1)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::CursorBeyondDataset { cursor: 2, len: 1 }));
}

/// Corrupt interior output stops the run before anything is appended
#[tokio::test]
async fn test_run_withCorruptOutput_shouldFailWithoutWriting() {
    let dir = create_temp_dir().unwrap();
    let source = Arc::new(StaticSource::new((0..5).map(quora_sample).collect()));
    let output = output_path(dir.path(), "quora");
    fs::create_dir_all(output.parent().unwrap()).unwrap();
    fs::write(&output, "{}\n{oops\n{}\n").unwrap();

    let err = pipeline(dir.path(), source, upper())
        .run(info("quora"), &output, 1)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::CorruptOutput { line: 2, .. }));
    assert_eq!(fs::read_to_string(&output).unwrap(), "{}\n{oops\n{}\n");
}

/// A malformed cached dataset fails fast with its location
#[tokio::test]
async fn test_run_withMalformedSourceCache_shouldFail() {
    let dir = create_temp_dir().unwrap();
    create_test_file(&dir.path().join("english").join("quora"), "quora.jsonl", "{\"_id\":\"0\"}\nnot json\n").unwrap();
    let source = Arc::new(StaticSource::new(Vec::new()));

    let err = pipeline(dir.path(), source.clone(), upper())
        .run(info("quora"), &output_path(dir.path(), "quora"), 1)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Dataset(DatasetError::MalformedCache { line: 2, .. })));
    assert_eq!(source.calls(), 0);
}

/// An existing cache is used instead of downloading
#[tokio::test]
async fn test_run_withCachedSource_shouldNotDownload() {
    let dir = create_temp_dir().unwrap();
    write_source_cache(dir.path(), "quora", &[quora_sample(0), quora_sample(1)]).unwrap();
    let source = Arc::new(StaticSource::new(Vec::new()));
    let output = output_path(dir.path(), "quora");

    let report = pipeline(dir.path(), source.clone(), upper())
        .run(info("quora"), &output, 5)
        .await
        .unwrap();

    assert_eq!(report.translated, 2);
    assert_eq!(source.calls(), 0);
}

/// An output path that cannot be written halts the run before any translation
#[tokio::test]
async fn test_run_withUnwritableOutputParent_shouldFailWithIoError() {
    let dir = create_temp_dir().unwrap();
    let source = Arc::new(StaticSource::new((0..3).map(quora_sample).collect()));
    let blocker = create_test_file(dir.path(), "not_a_dir", "plain file\n").unwrap();
    let output = blocker.join("quora_dutch.jsonl");
    let provider = upper();

    let err = pipeline(dir.path(), source.clone(), provider.clone())
        .run(info("quora"), &output, 3)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Io { ref path, .. } if path == &output), "unexpected error: {err}");
    assert_eq!(source.calls(), 1);
    assert_eq!(provider.request_count(), 0);
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "plain file\n");
}

/// An output path occupied by a directory halts the run with an I/O error
#[tokio::test]
async fn test_run_withDirectoryAtOutputPath_shouldFailWithIoError() {
    let dir = create_temp_dir().unwrap();
    let source = Arc::new(StaticSource::new((0..3).map(quora_sample).collect()));
    let output = output_path(dir.path(), "quora");
    fs::create_dir_all(&output).unwrap();
    let provider = upper();

    let err = pipeline(dir.path(), source, provider.clone())
        .run(info("quora"), &output, 3)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Io { .. }), "unexpected error: {err}");
    assert_eq!(provider.request_count(), 0);
    assert!(output.is_dir());
}
