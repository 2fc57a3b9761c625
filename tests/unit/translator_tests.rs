/*!
 * Tests for the text translator and per-sample translation
 */

use serde_json::json;
use std::sync::Arc;

use dataset_translator::Config;
use dataset_translator::dataset::DatasetShape;
use dataset_translator::providers::mock::MockProvider;
use dataset_translator::translation::{TextTranslator, TranslationCache, TranslationOutcome, translate_sample};

use crate::common::{ms_marco_sample, sample};

fn translator_with(provider: MockProvider, config: &Config) -> TextTranslator {
    TextTranslator::new(Arc::new(provider), config).unwrap()
}

/// The user turn names the target language
#[tokio::test]
async fn test_translator_withDefaultConfig_shouldSendLanguageNames() {
    let provider = MockProvider::working();
    let translator = translator_with(provider.clone(), &Config::default());

    translator.translate("Where is the station?").await;

    assert_eq!(
        provider.requests(),
        vec!["Translate this text to Dutch: Where is the station?".to_string()]
    );
    assert_eq!(translator.model(), "gpt-4o-mini");
    assert_eq!(translator.provider_name(), "mock");
}

/// A provider failure returns the input unchanged
#[tokio::test]
async fn test_translator_withFailure_shouldFallBackToOriginal() {
    let translator = translator_with(MockProvider::failing_on("hello"), &Config::default());

    let (text, outcome) = translator.translate_with_outcome("hello").await;

    assert_eq!(text, "hello");
    assert!(matches!(outcome, TranslationOutcome::Failed(_)));
}

/// Empty completions count as failures
#[tokio::test]
async fn test_translator_withEmptyReply_shouldKeepOriginal() {
    let translator = translator_with(MockProvider::empty(), &Config::default());

    let (text, outcome) = translator.translate_with_outcome("hello").await;

    assert_eq!(text, "hello");
    assert!(outcome.is_failure());
}

/// Translators sharing a cache reuse each other's results
#[tokio::test]
async fn test_translator_withSharedCache_shouldAvoidRepeatRequests() {
    let provider = MockProvider::working();
    let cache = TranslationCache::new(true);
    let first = translator_with(provider.clone(), &Config::default()).with_cache(cache.clone());
    let second = translator_with(provider.clone(), &Config::default()).with_cache(cache.clone());

    first.translate("shared").await;
    let (_, outcome) = second.translate_with_outcome("shared").await;

    assert_eq!(outcome, TranslationOutcome::Cached);
    assert_eq!(provider.request_count(), 1);
    assert_eq!(cache.len(), 1);
}

/// Caching can be switched off in the configuration
#[tokio::test]
async fn test_translator_withCacheDisabled_shouldCallEveryTime() {
    let provider = MockProvider::working();
    let mut config = Config::default();
    config.translation.common.cache_translations = false;
    let translator = translator_with(provider.clone(), &config);

    translator.translate("again").await;
    translator.translate("again").await;

    assert_eq!(provider.request_count(), 2);
}

/// Every passage is translated and stays in place
#[tokio::test]
async fn test_translateSample_withPassages_shouldKeepCountAndOrder() {
    let mut config = Config::default();
    config.translation.common.user_prompt = "{text}".to_string();
    config.translation.common.concurrent_requests = 3;
    let provider = MockProvider::working().with_custom_response(|text| format!("nl:{}", text));
    let translator = translator_with(provider, &config);
    let s = sample(json!({
        "query": "q",
        "answers": [],
        "passages": {"passage_text": ["p0", "p1", "p2", "p3", "p4"], "is_selected": [0, 0, 0, 0, 1]}
    }));

    let result = translate_sample(DatasetShape::MsMarco, &s, &translator).await;

    assert_eq!(
        result.record["passages"]["passage_text"],
        json!(["nl:p0", "nl:p1", "nl:p2", "nl:p3", "nl:p4"])
    );
    assert_eq!(result.record["answers"], json!([]));
}

/// When everything fails the record equals the original
#[tokio::test]
async fn test_translateSample_withAlwaysFailingProvider_shouldEqualOriginal() {
    let translator = translator_with(MockProvider::failing(), &Config::default());
    let s = ms_marco_sample(7);

    let result = translate_sample(DatasetShape::MsMarco, &s, &translator).await;

    assert_eq!(result.record, s);
    assert_eq!(result.failed_fields, 4);
}
