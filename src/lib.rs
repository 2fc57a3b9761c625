/*!
 * # dataset-translator
 *
 * Resumable translation of Hugging Face question/passage datasets with AI providers.
 *
 * ## Features
 *
 * - Download a supported dataset once and cache it locally as JSON lines
 * - Translate every text field of every sample, keeping the record layout intact
 * - Append translated records one at a time so an interrupted run resumes where it stopped
 * - Keep the original text of a field when its translation fails instead of aborting
 * - Translate using various AI providers:
 *   - OpenAI API
 *   - Anthropic API
 *   - Ollama (local LLM)
 *   - LM Studio (OpenAI compatible)
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `dataset`: Supported datasets, record shapes, download and local cache
 * - `progress`: Resume cursor of an output file
 * - `translation`: Text translator, sample translation and the batch pipeline
 * - `providers`: Client implementations for various LLM providers
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod dataset;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod progress;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use dataset::{DatasetRegistry, DatasetShape, Sample};
pub use errors::{AppError, DatasetError, PipelineError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match};
pub use progress::ProgressTracker;
pub use translation::{BatchPipeline, RunReport, StopReason, TextTranslator};
