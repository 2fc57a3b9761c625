use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Root directory holding the cached source datasets and the translated output
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Translation config
    pub translation: TranslationConfig,

    /// Dataset download settings
    #[serde(default)]
    pub hub: HubConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: OpenAI
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: Ollama
    Ollama,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    // @returns: Whether requests must carry an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic)
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: Name of the environment variable holding the API key
    #[serde(default = "String::new")]
    pub api_key_env: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                endpoint: default_openai_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key_env: "ANTHROPIC_API_KEY".to_string(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_anthropic_timeout_secs(),
            },
            TranslationProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key_env: String::new(),
                endpoint: default_ollama_endpoint(),
                timeout_secs: default_local_timeout_secs(),
            },
            TranslationProvider::LMStudio => Self {
                provider_type: "lmstudio".to_string(),
                model: default_lmstudio_model(),
                api_key_env: String::new(),
                endpoint: default_lmstudio_endpoint(),
                timeout_secs: default_local_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// User turn template
    /// Placeholders: {source_language}, {target_language}, {text}
    #[serde(default = "default_user_prompt")]
    pub user_prompt: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Number of texts of one sample translated at the same time
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Reuse translations of identical texts within a run
    #[serde(default = "default_true")]
    pub cache_translations: bool,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            user_prompt: default_user_prompt(),
            temperature: default_temperature(),
            concurrent_requests: default_concurrent_requests(),
            cache_translations: default_true(),
        }
    }
}

/// Where and how source datasets are fetched
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HubConfig {
    /// Base URL of the datasets-server API
    #[serde(default = "default_hub_endpoint")]
    pub endpoint: String,

    /// Environment variable holding an optional access token
    #[serde(default = "default_hub_token_env")]
    pub token_env: String,

    /// Rows requested per page (the API caps this at 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Retries for a failed page request
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff between retries in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            endpoint: default_hub_endpoint(),
            token_env: default_hub_token_env(),
            page_size: default_page_size(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HubConfig {
    /// Access token from the environment, if set and non-empty
    pub fn token(&self) -> Option<String> {
        if self.token_env.is_empty() {
            return None;
        }
        std::env::var(&self.token_env).ok().filter(|token| !token.is_empty())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_hub_endpoint() -> String {
    "https://datasets-server.huggingface.co".to_string()
}

fn default_hub_token_env() -> String {
    "HF_TOKEN".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_concurrent_requests() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_anthropic_timeout_secs() -> u64 {
    120
}

fn default_local_timeout_secs() -> u64 {
    300
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_lmstudio_endpoint() -> String {
    // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
    "http://localhost:1234/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_lmstudio_model() -> String {
    // Placeholder; users should set to the loaded model name in LM Studio
    "local-model".to_string()
}

fn default_system_prompt() -> String {
    "You are a translation assistant specialized in {source_language} to {target_language}.".to_string()
}

fn default_user_prompt() -> String {
    "Translate this text to {target_language}: {text}".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::validate_language_code(&self.source_language)?;
        crate::language_utils::validate_language_code(&self.target_language)?;

        if self.translation.get_model().trim().is_empty() {
            return Err(anyhow!("A model name is required for the {} provider",
                self.translation.provider.display_name()));
        }

        if self.translation.common.concurrent_requests == 0 {
            return Err(anyhow!("concurrent_requests must be at least 1"));
        }

        if self.hub.page_size == 0 || self.hub.page_size > 100 {
            return Err(anyhow!("hub.page_size must be between 1 and 100"));
        }

        if !self.translation.common.user_prompt.contains("{text}") {
            return Err(anyhow!("user_prompt must contain the {{text}} placeholder"));
        }

        if self.translation.provider.requires_api_key() && self.translation.get_api_key().is_empty() {
            let env_name = self.translation.get_api_key_env();
            return Err(anyhow!(
                "Translation API key is required for {} provider (set {} in the environment or .env)",
                self.translation.provider.display_name(),
                if env_name.is_empty() { "an API key variable".to_string() } else { env_name }
            ));
        }

        Ok(())
    }

    /// Directory holding the cached source-language datasets, one subdirectory each
    pub fn source_cache_root(&self) -> Result<PathBuf> {
        let language_dir = crate::language_utils::language_dir_name(&self.source_language)?;
        Ok(self.data_dir.join(language_dir))
    }

    /// Path of the translated output file for a dataset
    pub fn output_path(&self, dataset_name: &str) -> Result<PathBuf> {
        let language_dir = crate::language_utils::language_dir_name(&self.target_language)?;
        Ok(self
            .data_dir
            .join(&language_dir)
            .join(dataset_name)
            .join(format!("{}_{}.jsonl", dataset_name, language_dir)))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "nl".to_string(),
            data_dir: default_data_dir(),
            translation: TranslationConfig::default(),
            hub: HubConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, inserting defaults if missing
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let index = match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider.clone()));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::OpenAI => default_openai_model(),
            TranslationProvider::Anthropic => default_anthropic_model(),
            TranslationProvider::Ollama => default_ollama_model(),
            TranslationProvider::LMStudio => default_lmstudio_model(),
        }
    }

    /// Name of the environment variable carrying the API key
    pub fn get_api_key_env(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key_env.is_empty() {
                return provider_config.api_key_env.clone();
            }
        }

        ProviderConfig::new(self.provider.clone()).api_key_env
    }

    /// Get the API key for the active provider from the environment
    pub fn get_api_key(&self) -> String {
        let env_name = self.get_api_key_env();
        if env_name.is_empty() {
            return String::new();
        }

        std::env::var(&env_name).unwrap_or_default().trim().to_string()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::OpenAI => default_openai_endpoint(),
            TranslationProvider::Anthropic => default_anthropic_endpoint(),
            TranslationProvider::Ollama => default_ollama_endpoint(),
            TranslationProvider::LMStudio => default_lmstudio_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => ProviderConfig::new(self.provider.clone()).timeout_secs,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: TranslationProvider::default(),
            available_providers: Vec::new(),
            common: TranslationCommonConfig::default(),
        };

        // Add default providers
        config.available_providers.push(ProviderConfig::new(TranslationProvider::OpenAI));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::Anthropic));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::Ollama));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::LMStudio));

        config
    }
}
