use futures::stream::{self, StreamExt};

use super::translator::TextTranslator;
use crate::dataset::{DatasetShape, FieldValue, Sample, TranslatedSample};

/// A rebuilt record together with what went wrong producing it
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTranslation {
    /// The sample in its original shape with translated fields
    pub record: Sample,
    /// Texts that kept their original value because translation failed
    pub failed_fields: usize,
}

/// Extract, translate and rebuild one sample.
///
/// Every text of every translatable field is translated independently, up to
/// the translator's concurrency at a time. Results are reassembled in their
/// original positions, so list fields keep their length and order.
pub async fn translate_sample(
    shape: DatasetShape,
    sample: &Sample,
    translator: &TextTranslator,
) -> SampleTranslation {
    let processed = shape.extract(sample);

    let texts: Vec<&str> = processed.values().flat_map(FieldValue::texts).collect();
    let results: Vec<(String, bool)> = stream::iter(texts)
        .map(|text| async move {
            let (translated, outcome) = translator.translate_with_outcome(text).await;
            (translated, outcome.is_failure())
        })
        .buffered(translator.concurrency())
        .collect()
        .await;

    let failed_fields = results.iter().filter(|(_, failed)| *failed).count();
    let mut results = results.into_iter().map(|(text, _)| text);

    let translated: TranslatedSample = processed
        .iter()
        .map(|(name, value)| {
            let value = match value {
                FieldValue::Text(original) => {
                    FieldValue::Text(results.next().unwrap_or_else(|| original.clone()))
                }
                FieldValue::List(items) => FieldValue::List(
                    items
                        .iter()
                        .map(|original| results.next().unwrap_or_else(|| original.clone()))
                        .collect(),
                ),
            };
            (*name, value)
        })
        .collect();

    SampleTranslation {
        record: shape.rebuild(&translated, sample),
        failed_fields,
    }
}
