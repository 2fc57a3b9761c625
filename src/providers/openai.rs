use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatCompletion, error_from_response, http_client};
use crate::errors::ProviderError;

/// OpenAI client for the chat completions API
///
/// Also drives OpenAI-compatible servers such as LM Studio.
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Sampling temperature sent with every request
    temperature: Option<f32>,
    /// Name reported in logs
    name: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message; null for refusals and tool calls
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Reasoning models reject the temperature parameter
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

impl OpenAIRequest {
    /// Create a new request for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: Some(content.into()),
        });
        self
    }

    /// Set the temperature, ignored for reasoning models
    pub fn temperature(mut self, temperature: f32) -> Self {
        if !is_reasoning_model(&self.model) {
            self.temperature = Some(temperature);
        }
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            temperature: None,
            name: "openai".to_string(),
        }
    }

    /// Send this temperature with every request
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the name used in logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn completions_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/chat/completions", base)
    }

    /// Complete a chat request
    pub async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            error!("{} API error: {}", self.name, err);
            return Err(err);
        }

        let parsed = response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "{} usage: {} prompt + {} completion = {} tokens",
                self.name, usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(parsed)
    }

    /// Extract text from the first choice
    pub fn extract_text(response: &OpenAIResponse) -> Option<String> {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
    }
}

#[async_trait]
impl ChatCompletion for OpenAI {
    async fn chat_complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        model: &str,
    ) -> Result<String, ProviderError> {
        let mut request = OpenAIRequest::new(model)
            .add_message("system", system_prompt)
            .add_message("user", user_text);
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }

        let response = self.complete(request).await?;
        match Self::extract_text(&response) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ProviderError::EmptyResponse),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
