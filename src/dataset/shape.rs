/*!
 * Dataset record shapes.
 *
 * Each supported dataset stores its translatable text in a few known places. A
 * [`DatasetShape`] knows those places: `extract` projects a raw record onto the
 * translatable fields and `rebuild` overlays translated values back onto a copy
 * of the original record, leaving everything else untouched.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::Sample;

/// Value of one translatable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single text
    Text(String),
    /// Ordered list of texts
    List(Vec<String>),
}

impl FieldValue {
    /// True when there is no text to carry over
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// Texts in order
    pub fn texts(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(text) => vec![text.as_str()],
            FieldValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        }
    }
}

/// Translatable projection of a sample, keyed by field name.
///
/// Iteration is in field-name order, which is also the order texts are sent for translation.
pub type ProcessedSample = BTreeMap<&'static str, FieldValue>;

/// A [`ProcessedSample`] whose texts have been translated
pub type TranslatedSample = ProcessedSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    List,
}

/// Where a translatable field lives inside a raw record
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Name in the processed sample
    pub name: &'static str,
    /// Object path inside the raw record
    pub path: &'static [&'static str],
    kind: FieldKind,
}

const MS_MARCO_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "query", path: &["query"], kind: FieldKind::Text },
    FieldSpec { name: "answers", path: &["answers"], kind: FieldKind::List },
    FieldSpec { name: "passages", path: &["passages", "passage_text"], kind: FieldKind::List },
];

const QUORA_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "title", path: &["title"], kind: FieldKind::Text },
    FieldSpec { name: "text", path: &["text"], kind: FieldKind::Text },
];

/// Record layouts of the supported datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetShape {
    /// `query`, `answers[]` and `passages.passage_text[]`
    MsMarco,
    /// `title` and `text`
    Quora,
}

impl DatasetShape {
    /// Translatable fields and where they live in a raw record
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            DatasetShape::MsMarco => MS_MARCO_FIELDS,
            DatasetShape::Quora => QUORA_FIELDS,
        }
    }

    /// Project a sample onto its translatable fields.
    ///
    /// Never fails: a missing or non-text field becomes an empty string or list,
    /// a lone string where a list is expected becomes a one-element list, and
    /// non-string list items are skipped.
    pub fn extract(&self, sample: &Sample) -> ProcessedSample {
        self.fields()
            .iter()
            .map(|spec| {
                let raw = lookup(sample, spec.path);
                let value = match spec.kind {
                    FieldKind::Text => FieldValue::Text(
                        raw.and_then(Value::as_str).unwrap_or_default().to_string(),
                    ),
                    FieldKind::List => FieldValue::List(match raw {
                        Some(Value::Array(items)) => items
                            .iter()
                            .filter_map(|item| item.as_str().map(str::to_string))
                            .collect(),
                        Some(Value::String(text)) => vec![text.clone()],
                        _ => Vec::new(),
                    }),
                };
                (spec.name, value)
            })
            .collect()
    }

    /// Overlay translated fields onto a copy of `original`.
    ///
    /// Fields outside the translatable set, and siblings of nested fields, are kept
    /// as they were. Translated list items replace the original's string items
    /// position by position. A field absent from the original is only added when
    /// its translated value is non-empty.
    pub fn rebuild(&self, translated: &TranslatedSample, original: &Sample) -> Sample {
        let mut rebuilt = original.clone();

        for spec in self.fields() {
            let Some(value) = translated.get(spec.name) else {
                continue;
            };
            let Some(merged) = merge(lookup(original, spec.path), value) else {
                continue;
            };
            let Some((leaf, parents)) = spec.path.split_last() else {
                continue;
            };
            if let Some(parent) = parent_mut(&mut rebuilt, parents) {
                parent.insert((*leaf).to_string(), merged);
            }
        }

        rebuilt
    }
}

fn lookup<'a>(sample: &'a Sample, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = sample.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Walks `path` creating missing objects; `None` if something else is in the way
fn parent_mut<'a>(sample: &'a mut Sample, path: &[&str]) -> Option<&'a mut Sample> {
    let mut current = sample;
    for key in path {
        current = current
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Sample::new()))
            .as_object_mut()?;
    }
    Some(current)
}

fn merge(existing: Option<&Value>, translated: &FieldValue) -> Option<Value> {
    match (existing, translated) {
        (Some(Value::String(_)), FieldValue::Text(text)) => Some(Value::String(text.clone())),
        (Some(Value::String(_)), FieldValue::List(items)) => {
            items.first().map(|text| Value::String(text.clone()))
        }
        (Some(Value::Array(items)), FieldValue::List(texts)) => Some(overlay(items, texts)),
        (None, value) if !value.is_empty() => Some(value.to_value()),
        _ => None,
    }
}

fn overlay(items: &[Value], texts: &[String]) -> Value {
    let mut texts = texts.iter();
    let mut merged: Vec<Value> = items
        .iter()
        .map(|item| match item {
            Value::String(_) => texts
                .next()
                .map(|text| Value::String(text.clone()))
                .unwrap_or_else(|| item.clone()),
            _ => item.clone(),
        })
        .collect();
    merged.extend(texts.cloned().map(Value::String));
    Value::Array(merged)
}
