use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatCompletion, error_from_response, http_client};
use crate::errors::ProviderError;

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Sampling temperature sent with every request
    temperature: Option<f32>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant, or tool)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl ChatRequest {
    /// Create a new non-streaming chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
            stream: false,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions { temperature: Some(temperature) });
        self
    }
}

impl Ollama {
    /// Create a new Ollama client from a base URL such as `http://localhost:11434`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url
        } else {
            format!("http://{}", base_url)
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout),
            temperature: None,
        }
    }

    /// Send this temperature with every request
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Chat with the Ollama API
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self.client.post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            error!("Ollama API error: {}", err);
            return Err(err);
        }

        let response_text = response.text().await?;
        if let Ok(chat_response) = serde_json::from_str::<ChatResponse>(&response_text) {
            return Ok(chat_response);
        }

        // Some Ollama builds stream JSONL even when stream=false; stitch the pieces together
        let mut content = String::new();
        let mut last: Option<ChatResponse> = None;
        for line in response_text.lines().filter(|l| !l.trim().is_empty()) {
            let piece = serde_json::from_str::<ChatResponse>(line)
                .map_err(|e| ProviderError::ParseError(e.to_string()))?;
            content.push_str(&piece.message.content);
            last = Some(piece);
        }

        match last {
            Some(mut final_piece) => {
                final_piece.message.content = content;
                Ok(final_piece)
            }
            None => Err(ProviderError::ParseError("empty response body".to_string())),
        }
    }
}

#[async_trait]
impl ChatCompletion for Ollama {
    async fn chat_complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        model: &str,
    ) -> Result<String, ProviderError> {
        let messages = vec![
            ChatMessage { role: "system".to_string(), content: system_prompt.to_string() },
            ChatMessage { role: "user".to_string(), content: user_text.to_string() },
        ];
        let mut request = ChatRequest::new(model, messages);
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }

        let response = self.chat(request).await?;
        if response.message.content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(response.message.content)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
