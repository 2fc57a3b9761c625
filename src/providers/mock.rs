/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with translated text
 * - `MockProvider::failing_on(..)` - Fails only for matching inputs
 * - `MockProvider::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::ChatCompletion;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Fails whenever the user turn contains the given text
    FailWhenContains(String),
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns empty response
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Every user turn received, in order
    requests: Arc<Mutex<Vec<String>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that fails for inputs containing `needle`
    pub fn failing_on(needle: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailWhenContains(needle.into()))
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every user turn received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn translate(&self, user_text: &str) -> String {
        match self.custom_response {
            Some(generator) => generator(user_text),
            None => format!("[TRANSLATED] {}", user_text),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl ChatCompletion for MockProvider {
    async fn chat_complete(
        &self,
        _system_prompt: &str,
        user_text: &str,
        _model: &str,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(user_text.to_string());

        match &self.behavior {
            MockBehavior::Working => Ok(self.translate(user_text)),

            MockBehavior::FailWhenContains(needle) => {
                if user_text.contains(needle.as_str()) {
                    Err(ProviderError::RequestFailed(format!("Simulated failure for '{}'", needle)))
                } else {
                    Ok(self.translate(user_text))
                }
            }

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.translate(user_text))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(self.translate(user_text))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
