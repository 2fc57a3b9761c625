/*!
 * Tests for the dataset registry and record shapes
 */

use serde_json::json;

use dataset_translator::dataset::{DatasetRegistry, DatasetShape, FieldValue, TranslatedSample};
use dataset_translator::errors::DatasetError;

use crate::common::{ms_marco_sample, quora_sample, sample};

/// Unknown names are rejected with the supported list in the message
#[test]
fn test_registry_withUnknownName_shouldListSupportedDatasets() {
    let err = DatasetRegistry::get("natural_questions").unwrap_err();

    assert!(matches!(err, DatasetError::Unsupported { .. }));
    assert_eq!(
        err.to_string(),
        "Dataset 'natural_questions' is not supported. Supported datasets: ms_marco, quora"
    );
}

/// Each registered dataset points at its hub repository
#[test]
fn test_registry_withKnownNames_shouldDescribeDatasets() {
    let quora = DatasetRegistry::get("quora").unwrap();
    assert_eq!(quora.huggingface_path, "BeIR/quora");
    assert_eq!(quora.shape, DatasetShape::Quora);

    assert_eq!(DatasetRegistry::names(), vec!["ms_marco", "quora"]);
    assert_eq!(DatasetRegistry::all().len(), 2);
}

/// Identity translation rebuilds the exact original record
#[test]
fn test_rebuild_withUntranslatedValues_shouldReproduceOriginal() {
    for s in [ms_marco_sample(3), quora_sample(3)] {
        let shape = if s.contains_key("_id") { DatasetShape::Quora } else { DatasetShape::MsMarco };

        let rebuilt = shape.rebuild(&shape.extract(&s), &s);

        assert_eq!(serde_json::to_string(&rebuilt).unwrap(), serde_json::to_string(&s).unwrap());
    }
}

/// Translated passages land in `passages.passage_text` with siblings untouched
#[test]
fn test_rebuild_withTranslatedPassages_shouldKeepSiblingMetadata() {
    let s = ms_marco_sample(1);
    let mut translated: TranslatedSample = DatasetShape::MsMarco.extract(&s);
    translated.insert("passages", FieldValue::List(vec!["eerste".into(), "tweede".into()]));
    translated.insert("query", FieldValue::Text("vraag".into()));

    let rebuilt = DatasetShape::MsMarco.rebuild(&translated, &s);

    assert_eq!(rebuilt["passages"]["passage_text"], json!(["eerste", "tweede"]));
    assert_eq!(rebuilt["passages"]["is_selected"], s["passages"]["is_selected"]);
    assert_eq!(rebuilt["passages"]["url"], s["passages"]["url"]);
    assert_eq!(rebuilt["query"], json!("vraag"));
    assert_eq!(rebuilt["answers"], s["answers"]);
    assert_eq!(rebuilt["query_id"], json!(1));
}

/// Extraction never fails, even on records missing every field
#[test]
fn test_extract_withEmptyRecord_shouldYieldEmptyValues() {
    let processed = DatasetShape::Quora.extract(&sample(json!({})));

    assert_eq!(processed["title"], FieldValue::Text(String::new()));
    assert_eq!(processed["text"], FieldValue::Text(String::new()));

    let rebuilt = DatasetShape::Quora.rebuild(&processed, &sample(json!({})));
    assert!(rebuilt.is_empty());
}
