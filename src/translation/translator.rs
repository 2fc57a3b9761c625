/*!
 * Single-text translation with graceful degradation.
 *
 * [`TextTranslator::translate`] never fails: when the provider errors the
 * failure is logged together with the offending text and the original text is
 * returned, so one bad field never stops a run. There is no retry.
 */

use anyhow::Result;
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::cache::{TranslationCache, truncate_text};
use crate::app_config::Config;
use crate::errors::ProviderError;
use crate::language_utils::get_language_name;
use crate::providers::ChatCompletion;

/// What happened to one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// Nothing to translate; text returned as is
    Skipped,
    /// Served from the cache
    Cached,
    /// Translated by the provider
    Translated,
    /// Provider failed; original text returned
    Failed(String),
}

impl TranslationOutcome {
    /// True when the original text had to be kept because of an error
    pub fn is_failure(&self) -> bool {
        matches!(self, TranslationOutcome::Failed(_))
    }
}

/// Counters over the lifetime of a translator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslatorStats {
    /// Provider calls made
    pub requests: usize,
    /// Provider calls that failed
    pub failures: usize,
    /// Texts served from the cache
    pub cache_hits: usize,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicUsize,
    failures: AtomicUsize,
    cache_hits: AtomicUsize,
}

/// Translates single texts through a chat-completion provider
#[derive(Debug, Clone)]
pub struct TextTranslator {
    provider: Arc<dyn ChatCompletion>,
    model: String,
    target_language: String,
    system_prompt: String,
    user_prompt: String,
    cache: TranslationCache,
    concurrency: usize,
    counters: Arc<Counters>,
}

impl TextTranslator {
    /// Build a translator from the configuration.
    ///
    /// Language placeholders in both prompts are filled in here; `{text}` in the
    /// user prompt is filled per call.
    pub fn new(provider: Arc<dyn ChatCompletion>, config: &Config) -> Result<Self> {
        let source_name = get_language_name(&config.source_language)?;
        let target_name = get_language_name(&config.target_language)?;
        let fill = |template: &str| {
            template
                .replace("{source_language}", &source_name)
                .replace("{target_language}", &target_name)
        };

        let common = &config.translation.common;
        Ok(Self {
            provider,
            model: config.translation.get_model(),
            target_language: config.target_language.clone(),
            system_prompt: fill(&common.system_prompt),
            user_prompt: fill(&common.user_prompt),
            cache: TranslationCache::new(common.cache_translations),
            concurrency: common.concurrent_requests.max(1),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Replace the cache, e.g. to share one between translators
    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    /// Translate `text`, returning the original on failure
    pub async fn translate(&self, text: &str) -> String {
        self.translate_with_outcome(text).await.0
    }

    /// Translate `text` and report how the result was obtained
    pub async fn translate_with_outcome(&self, text: &str) -> (String, TranslationOutcome) {
        if text.trim().is_empty() {
            return (text.to_string(), TranslationOutcome::Skipped);
        }

        if let Some(cached) = self.cache.get(text, &self.target_language, &self.model) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return (cached, TranslationOutcome::Cached);
        }

        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        let user_text = self.user_prompt.replace("{text}", text);
        let reply = self
            .provider
            .chat_complete(&self.system_prompt, &user_text, &self.model)
            .await
            .and_then(|reply| match reply.trim() {
                "" => Err(ProviderError::EmptyResponse),
                trimmed => Ok(trimmed.to_string()),
            });

        match reply {
            Ok(translated) => {
                debug!("Translated '{}' via {}", truncate_text(text, 40), self.provider.name());
                self.cache.store(text, &self.target_language, &self.model, &translated);
                (translated, TranslationOutcome::Translated)
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                error!("Translation failed for text: '{}'. Error: {}", text, e);
                (text.to_string(), TranslationOutcome::Failed(e.to_string()))
            }
        }
    }

    /// Texts of one sample translated at the same time
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Model sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> TranslatorStats {
        TranslatorStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
        }
    }

    /// The translation cache
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }
}
