/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - OpenAI: OpenAI API integration (also used for LM Studio)
 * - Anthropic: Anthropic API integration
 * - Ollama: Local LLM server
 * - Mock: Scripted provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// A provider turns one system instruction plus one user turn into one reply.
/// Implementations must not retry on their own; callers decide what a failure means.
#[async_trait]
pub trait ChatCompletion: Send + Sync + Debug {
    /// Send `system_prompt` and `user_text` to `model` and return the reply text
    async fn chat_complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        model: &str,
    ) -> Result<String, ProviderError>;

    /// Short provider name used in log lines
    fn name(&self) -> &str;
}

/// Build the configured provider client
pub fn from_config(config: &TranslationConfig) -> Arc<dyn ChatCompletion> {
    let timeout = Duration::from_secs(config.get_timeout_secs());
    let temperature = config.common.temperature;

    match config.provider {
        TranslationProvider::OpenAI => Arc::new(
            openai::OpenAI::new(config.get_api_key(), config.get_endpoint(), timeout)
                .with_temperature(temperature),
        ),
        TranslationProvider::LMStudio => {
            // LM Studio often doesn't require an API key; use a default if empty
            let api_key = {
                let k = config.get_api_key();
                if k.is_empty() { "lm-studio".to_string() } else { k }
            };
            Arc::new(
                openai::OpenAI::new(api_key, config.get_endpoint(), timeout)
                    .with_temperature(temperature)
                    .with_name("lmstudio"),
            )
        }
        TranslationProvider::Anthropic => Arc::new(
            anthropic::Anthropic::new(config.get_api_key(), config.get_endpoint(), timeout)
                .with_temperature(temperature),
        ),
        TranslationProvider::Ollama => Arc::new(
            ollama::Ollama::new(config.get_endpoint(), timeout).with_temperature(temperature),
        ),
    }
}

/// Build an HTTP client with the given request timeout
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_default()
}

/// Turn a non-success response into a `ProviderError`, keeping the body for diagnostics
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    ProviderError::from_status(status.as_u16(), body)
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
