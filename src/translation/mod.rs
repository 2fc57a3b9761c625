/*!
 * Translation of dataset samples.
 *
 * - `cache`: reuse of translations of repeated texts
 * - `translator`: one text in, one text out, falling back to the original on failure
 * - `sample`: extract, translate and rebuild a whole sample
 * - `pipeline`: resumable run over a dataset with durable per-sample appends
 */

pub use self::cache::TranslationCache;
pub use self::pipeline::{BatchPipeline, PipelineState, RunReport, StopReason};
pub use self::sample::{SampleTranslation, translate_sample};
pub use self::translator::{TextTranslator, TranslationOutcome, TranslatorStats};

pub mod cache;
pub mod pipeline;
pub mod sample;
pub mod translator;
