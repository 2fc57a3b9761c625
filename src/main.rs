// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::{Path, PathBuf};

use dataset_translator::app_config::{self, Config, TranslationProvider};
use dataset_translator::app_controller::Controller;
use dataset_translator::translation::StopReason;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate new samples of a dataset, resuming after the ones already done
    Translate(TranslateArgs),

    /// List supported datasets with their local cache and translation progress
    Datasets(SharedArgs),

    /// Generate shell completions for dataset-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct SharedArgs {
    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json")]
    config_path: String,

    /// Root directory for cached datasets and translated output
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Name of the dataset to translate (e.g. ms_marco)
    #[arg(short, long, alias = "dataset_name")]
    dataset: String,

    /// Number of new samples to translate in this run
    #[arg(short, long, alias = "num_samples", default_value_t = 1000)]
    num_samples: usize,

    /// Push the translated dataset to the Hugging Face hub afterwards
    #[arg(long, alias = "push_to_hub")]
    push_to_hub: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'nl')
    #[arg(short, long)]
    target_language: Option<String>,

    #[command(flatten)]
    shared: SharedArgs,
}

/// dataset-translator - resumable dataset translation with AI
///
/// Downloads a Hugging Face question/passage dataset, translates every text
/// field with an AI provider and appends the translated records to a JSON lines
/// file. Re-running the same command continues where the previous run stopped.
#[derive(Parser, Debug)]
#[command(name = "dataset-translator")]
#[command(version)]
#[command(about = "Resumable AI translation of Hugging Face datasets")]
#[command(long_about = "dataset-translator translates Hugging Face question/passage datasets with AI providers.

EXAMPLES:
    dataset-translator translate --dataset ms_marco                  # Translate the next 1000 samples
    dataset-translator translate -d quora -n 50 -t de                # 50 samples of quora into German
    dataset-translator translate -d ms_marco -p ollama -m llama3.2:3b
    dataset-translator datasets                                      # Show cache and progress per dataset
    dataset-translator completions bash > dataset-translator.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. API keys are read from the environment
    (or a .env file), never from the config file.

OUTPUT:
    data/<source language>/<dataset>/<dataset>.jsonl          cached source samples
    data/<target language>/<dataset>/<dataset>_<target>.jsonl  translated records

SUPPORTED PROVIDERS:
    openai    - OpenAI API (requires OPENAI_API_KEY, default: gpt-4o-mini)
    anthropic - Anthropic Claude API (requires ANTHROPIC_API_KEY)
    ollama    - Local Ollama server (default: llama3.2:3b)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn decoration_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::decoration_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    // API keys may live in a .env file next to the config
    dotenvy::dotenv().ok();

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "dataset-translator", &mut std::io::stdout());
            Ok(())
        }
        Commands::Datasets(shared) => run_datasets(shared),
        Commands::Translate(args) => run_translate(args).await,
    }
}

/// Load the config file, creating a default one if missing, and apply shared CLI overrides
fn load_config(shared: &SharedArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &shared.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config_path = &shared.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    if let Some(data_dir) = &shared.data_dir {
        config.data_dir = data_dir.clone();
    }

    match &shared.log_level {
        Some(log_level) => config.log_level = log_level.clone().into(),
        None => log::set_max_level(level_filter(&config.log_level)),
    }

    Ok(config)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let mut config = load_config(&options.shared)?;

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    let report = controller
        .run(&options.dataset, options.num_samples, options.push_to_hub)
        .await?;

    if report.stop_reason == StopReason::Interrupted {
        warn!(
            "Run interrupted; {} records are saved. Run the same command again to continue.",
            report.end_cursor
        );
    }

    Ok(())
}

fn run_datasets(shared: SharedArgs) -> Result<()> {
    let config = load_config(&shared)?;
    let controller = Controller::with_config(config)?;

    for status in controller.dataset_statuses()? {
        let cached = match status.cached_samples {
            Some(count) => format!("{} samples cached", count),
            None => "not downloaded".to_string(),
        };
        info!(
            "{} ({}): {}; {}; {} translated",
            status.name, status.huggingface_path, status.description, cached, status.translated_samples
        );
    }

    Ok(())
}
