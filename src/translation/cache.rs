/*!
 * In-memory reuse of translations.
 *
 * Dataset records repeat a lot of text (boilerplate answers, shared passages).
 * The cache maps a source text to its translation for one language pair and
 * model so repeats within a run cost a single request. Only successful
 * translations are stored.
 */

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default upper bound on cached entries
pub const DEFAULT_CACHE_CAPACITY: usize = 50_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source_text: String,
    target_language: String,
    model: String,
}

impl CacheKey {
    fn new(source_text: &str, target_language: &str, model: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            target_language: target_language.to_string(),
            model: model.to_string(),
        }
    }
}

/// Shared translation cache; clones see the same entries and counters
#[derive(Debug, Clone)]
pub struct TranslationCache {
    entries: Arc<RwLock<HashMap<CacheKey, String>>>,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
    capacity: usize,
    enabled: bool,
}

impl TranslationCache {
    /// Create a cache with the default capacity
    pub fn new(enabled: bool) -> Self {
        Self::with_capacity(enabled, DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` entries
    pub fn with_capacity(enabled: bool, capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
            capacity,
            enabled,
        }
    }

    /// Look up a translation
    pub fn get(&self, source_text: &str, target_language: &str, model: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(source_text, target_language, model);
        let found = self.entries.read().get(&key).cloned();
        match &found {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for '{}'", truncate_text(source_text, 30));
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        found
    }

    /// Remember a translation; ignored once the cache is full
    pub fn store(&self, source_text: &str, target_language: &str, model: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            return;
        }
        entries.insert(CacheKey::new(source_text, target_language, model), translation.to_string());
    }

    /// Hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };
        (hits, misses, hit_rate)
    }

    /// Drop all entries and reset the counters
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether lookups and stores are active
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Shorten text for log lines, respecting character boundaries
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
