/*!
 * Error types for the dataset-translator application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The provider answered but produced no text
    #[error("API returned an empty completion")]
    EmptyResponse,

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and body onto the closest variant
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised while resolving or loading a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The dataset name is not in the registry
    #[error("Dataset '{name}' is not supported. Supported datasets: {}", supported.join(", "))]
    Unsupported {
        /// Requested name
        name: String,
        /// Every registered name, in registry order
        supported: Vec<String>,
    },

    /// Fetching rows from the remote dataset host failed
    #[error("Dataset download failed: {0}")]
    Download(String),

    /// The local JSONL copy of a dataset could not be parsed
    #[error("Malformed cached dataset {path:?} at line {line}: {reason}")]
    MalformedCache {
        /// Cache file path
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Parser message
        reason: String,
    },

    /// Filesystem error while reading or writing the cache
    #[error("Dataset I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that halt a translation run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The dataset could not be resolved or loaded
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Reading or appending the output file failed
    #[error("Output I/O error on {path:?}: {source}")]
    Io {
        /// Output file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A complete line of the output file is not valid JSON
    #[error("Output file {path:?} is corrupt at line {line}; refusing to resume")]
    CorruptOutput {
        /// Output file path
        path: PathBuf,
        /// 1-based line number
        line: usize,
    },

    /// The output already holds more records than the source dataset
    #[error("Output holds {cursor} records but the dataset only has {len}")]
    CursorBeyondDataset {
        /// Records already present in the output
        cursor: usize,
        /// Number of source samples
        len: usize,
    },

    /// An output record could not be serialized
    #[error("Failed to serialize output record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from dataset handling
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Error from the translation pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
