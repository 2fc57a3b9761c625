/*!
 * Resumable batch translation of one dataset.
 *
 * A run moves through `Loading -> Resuming -> Translating(i) -> Done`. The
 * output file is the progress record: samples before its record count are
 * skipped without touching the translator, and every new record is appended
 * and synced before the next sample starts. Killing the process at any point
 * loses at most the sample in flight.
 */

use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::sample::translate_sample;
use super::translator::TextTranslator;
use crate::dataset::{DatasetInfo, SampleStore};
use crate::errors::PipelineError;
use crate::file_utils::JsonlAppender;
use crate::progress::ProgressTracker;

/// Phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Resolving the source samples
    Loading,
    /// Computing the resume cursor
    Resuming,
    /// Working on the sample at this position
    Translating(usize),
    /// Finished
    Done,
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of samples was translated
    BudgetExhausted,
    /// No samples were left
    DatasetExhausted,
    /// The interrupt flag was raised
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::BudgetExhausted => write!(f, "requested samples translated"),
            StopReason::DatasetExhausted => write!(f, "end of dataset"),
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Dataset name
    pub dataset: String,
    /// Output file
    pub output_path: PathBuf,
    /// Records present before the run
    pub start_cursor: usize,
    /// Records present after the run
    pub end_cursor: usize,
    /// Samples translated by this run
    pub translated: usize,
    /// Texts left untranslated because the provider failed
    pub failed_fields: usize,
    /// Why the run stopped
    pub stop_reason: StopReason,
}

/// Called after every appended record with (done, target)
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Drives a translation run over one dataset
pub struct BatchPipeline {
    store: SampleStore,
    translator: TextTranslator,
    interrupt: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
}

impl BatchPipeline {
    /// Create a pipeline reading from `store` and translating with `translator`
    pub fn new(store: SampleStore, translator: TextTranslator) -> Self {
        Self {
            store,
            translator,
            interrupt: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    /// Stop before the next sample once `flag` is set
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    /// Report progress after each appended record
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Flag that stops the run before the next sample
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// The translator used for every text
    pub fn translator(&self) -> &TextTranslator {
        &self.translator
    }

    /// Translate up to `requested` samples of `info` not yet present in `output_path`
    pub async fn run(
        &self,
        info: &DatasetInfo,
        output_path: &Path,
        requested: usize,
    ) -> Result<RunReport, PipelineError> {
        let mut state = PipelineState::Loading;
        debug!("{}: {:?}", info.name, state);
        let samples = self.store.load_or_download(info).await?;

        state = PipelineState::Resuming;
        debug!("{}: {:?}", info.name, state);
        let resume = ProgressTracker::recover(output_path)?;
        let start_cursor = resume.records;
        if start_cursor > samples.len() {
            return Err(PipelineError::CursorBeyondDataset {
                cursor: start_cursor,
                len: samples.len(),
            });
        }

        let target = requested.min(samples.len() - start_cursor);
        info!(
            "Translating {} of {} remaining samples of {} ({} already done)",
            target,
            samples.len() - start_cursor,
            info.name,
            start_cursor
        );

        let mut translated = 0;
        let mut failed_fields = 0;
        let mut interrupted = false;

        if target > 0 {
            let mut writer = JsonlAppender::open(output_path)?;
            for (offset, sample) in samples.iter_from(start_cursor)?.take(target).enumerate() {
                if self.interrupt.load(Ordering::SeqCst) {
                    interrupted = true;
                    break;
                }

                state = PipelineState::Translating(start_cursor + offset);
                debug!("{}: {:?}", info.name, state);

                let sample = sample?;
                let result = translate_sample(info.shape, &sample, &self.translator).await;
                if result.failed_fields > 0 {
                    warn!(
                        "Sample {} kept {} untranslated text(s)",
                        start_cursor + offset,
                        result.failed_fields
                    );
                }
                writer.append(&result.record)?;

                translated += 1;
                failed_fields += result.failed_fields;
                if let Some(progress) = &self.progress {
                    progress(translated, target);
                }
            }
        }

        state = PipelineState::Done;
        debug!("{}: {:?}", info.name, state);

        let stop_reason = if interrupted {
            StopReason::Interrupted
        } else if translated == requested {
            StopReason::BudgetExhausted
        } else {
            StopReason::DatasetExhausted
        };
        info!("Translation complete. Translated {} new samples.", translated);

        Ok(RunReport {
            dataset: info.name.to_string(),
            output_path: output_path.to_path_buf(),
            start_cursor,
            end_cursor: start_cursor + translated,
            translated,
            failed_fields,
            stop_reason,
        })
    }
}
