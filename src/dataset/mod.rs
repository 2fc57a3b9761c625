/*!
 * Source datasets: what is supported, how records are shaped, and where they come from.
 *
 * - `registry`: static table of supported datasets
 * - `shape`: per-dataset extraction of translatable fields and reconstruction of records
 * - `hub`: remote row source backed by the Hugging Face datasets-server API
 * - `store`: ordered, cached access to a dataset's samples
 */

/// One dataset record: field name to JSON value
pub type Sample = serde_json::Map<String, serde_json::Value>;

pub mod hub;
pub mod registry;
pub mod shape;
pub mod store;

pub use self::hub::{DatasetSource, HubClient};
pub use self::registry::{DatasetInfo, DatasetRegistry};
pub use self::shape::{DatasetShape, FieldValue, ProcessedSample, TranslatedSample};
pub use self::store::{SampleSet, SampleStore};
