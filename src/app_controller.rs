use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::dataset::store::cache_file;
use crate::dataset::{DatasetRegistry, DatasetSource, HubClient, SampleSet, SampleStore};
use crate::file_utils::FileManager;
use crate::progress::ProgressTracker;
use crate::providers::{self, ChatCompletion};
use crate::translation::{BatchPipeline, RunReport, StopReason, TextTranslator};

// @module: Application controller for dataset translation

/// Local state of one registered dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStatus {
    /// Registry name
    pub name: &'static str,
    /// Hub repository id
    pub huggingface_path: &'static str,
    /// Description
    pub description: &'static str,
    /// Samples in the local cache, if downloaded
    pub cached_samples: Option<usize>,
    /// Records already in the translated output
    pub translated_samples: usize,
}

/// Main application controller for dataset translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Configuration this controller runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate up to `num_samples` new samples of `dataset` with the configured provider
    ///
    /// Ctrl-C stops the run after the sample in flight has been written; a second
    /// Ctrl-C exits immediately.
    pub async fn run(&self, dataset: &str, num_samples: usize, push_to_hub: bool) -> Result<RunReport> {
        let provider = providers::from_config(&self.config.translation);
        let source: Arc<dyn DatasetSource> = Arc::new(HubClient::from_config(&self.config.hub));

        let interrupt = Arc::new(AtomicBool::new(false));
        spawn_interrupt_handler(Arc::clone(&interrupt));

        let report = self.run_with(dataset, num_samples, provider, source, interrupt).await?;

        if push_to_hub {
            self.push_after(&report)?;
        }

        Ok(report)
    }

    /// Translate with an explicit provider, dataset source and interrupt flag
    pub async fn run_with(
        &self,
        dataset: &str,
        num_samples: usize,
        provider: Arc<dyn ChatCompletion>,
        source: Arc<dyn DatasetSource>,
        interrupt: Arc<AtomicBool>,
    ) -> Result<RunReport> {
        let start_time = Instant::now();
        let info = DatasetRegistry::get(dataset)?;
        let output_path = self.config.output_path(info.name)?;
        let cache_root = self.config.source_cache_root()?;

        info!(
            "🚀 {}: {} - {} ({} -> {})",
            info.name,
            self.config.translation.provider.display_name(),
            self.config.translation.get_model(),
            self.config.source_language,
            self.config.target_language
        );

        let translator = TextTranslator::new(provider, &self.config)?;
        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} samples ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let pipeline = BatchPipeline::new(SampleStore::new(cache_root, source), translator)
            .with_interrupt(interrupt)
            .with_progress(move |done, target| {
                pb.set_length(target as u64);
                pb.set_position(done as u64);
            });

        let result = pipeline
            .run(info, &output_path, num_samples)
            .await
            .with_context(|| format!("Translation of {} failed", info.name));
        progress_bar.finish_and_clear();
        let report = result?;

        let stats = pipeline.translator().stats();
        info!(
            "Stopped ({}) after {} samples in {}; output now holds {} records: {}",
            report.stop_reason,
            report.translated,
            format_duration(start_time.elapsed()),
            report.end_cursor,
            report.output_path.display()
        );
        info!(
            "{} requests, {} cache hits, {} failed",
            stats.requests, stats.cache_hits, stats.failures
        );
        if report.failed_fields > 0 {
            warn!(
                "{} text(s) were kept in the source language because translation failed",
                report.failed_fields
            );
        }

        Ok(report)
    }

    /// Publish the output of a finished run; an interrupted run is never pushed
    pub fn push_after(&self, report: &RunReport) -> Result<bool> {
        if report.stop_reason == StopReason::Interrupted {
            warn!("Run was interrupted; skipping push of {} to Hugging Face", report.dataset);
            return Ok(false);
        }

        self.push_to_hub(&report.dataset)?;
        Ok(true)
    }

    /// Publish a translated dataset to the hub
    pub fn push_to_hub(&self, dataset: &str) -> Result<()> {
        let output_path = self.config.output_path(dataset)?;
        info!("Pushing {} to Hugging Face...", output_path.display());
        warn!("Pushing to the Hugging Face hub is not yet implemented; nothing was uploaded");
        Ok(())
    }

    /// Cache and output state of every registered dataset
    pub fn dataset_statuses(&self) -> Result<Vec<DatasetStatus>> {
        let cache_root = self.config.source_cache_root()?;

        DatasetRegistry::all()
            .iter()
            .map(|info| -> Result<DatasetStatus> {
                let cache_path = cache_file(&cache_root, info.name);
                let cached_samples = if FileManager::file_exists(&cache_path) {
                    Some(SampleSet::open(&cache_path)?.len())
                } else {
                    None
                };
                let translated_samples = ProgressTracker::count_existing(&self.config.output_path(info.name)?)?;

                Ok(DatasetStatus {
                    name: info.name,
                    huggingface_path: info.huggingface_path,
                    description: info.description,
                    cached_samples,
                    translated_samples,
                })
            })
            .collect()
    }
}

/// First Ctrl-C raises `flag`, the second exits the process
fn spawn_interrupt_handler(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupt received, stopping after the current sample (press Ctrl-C again to abort)");
        flag.store(true, Ordering::SeqCst);

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Aborting");
            std::process::exit(130);
        }
    });
}

// Format duration in a human-readable format (HH:MM:SS)
fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
