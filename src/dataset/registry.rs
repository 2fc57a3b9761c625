use crate::errors::DatasetError;

use super::shape::DatasetShape;

/// Static description of a supported dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    /// Name used on the command line and in file names
    pub name: &'static str,
    /// Repository id on the Hugging Face hub
    pub huggingface_path: &'static str,
    /// Dataset configuration (subset); `None` selects the first one the hub reports
    pub config_name: Option<&'static str>,
    /// Human readable description
    pub description: &'static str,
    /// Record layout, which decides the translatable fields
    pub shape: DatasetShape,
}

/// Every dataset the translator knows how to handle
pub const SUPPORTED_DATASETS: &[DatasetInfo] = &[
    DatasetInfo {
        name: "ms_marco",
        huggingface_path: "microsoft/ms_marco",
        config_name: Some("v1.1"),
        description: "MS MARCO dataset for passage retrieval.",
        shape: DatasetShape::MsMarco,
    },
    DatasetInfo {
        name: "quora",
        huggingface_path: "BeIR/quora",
        config_name: Some("corpus"),
        description: "Quora Question Pairs dataset for question similarity.",
        shape: DatasetShape::Quora,
    },
];

/// Lookup over [`SUPPORTED_DATASETS`]
pub struct DatasetRegistry;

impl DatasetRegistry {
    /// Find a dataset by name
    pub fn get(name: &str) -> Result<&'static DatasetInfo, DatasetError> {
        SUPPORTED_DATASETS
            .iter()
            .find(|info| info.name == name)
            .ok_or_else(|| DatasetError::Unsupported {
                name: name.to_string(),
                supported: Self::names().into_iter().map(String::from).collect(),
            })
    }

    /// Registered names, in registry order
    pub fn names() -> Vec<&'static str> {
        SUPPORTED_DATASETS.iter().map(|info| info.name).collect()
    }

    /// All registered datasets
    pub fn all() -> &'static [DatasetInfo] {
        SUPPORTED_DATASETS
    }
}
