/*!
 * Ordered access to a dataset's samples.
 *
 * The first time a dataset is requested it is fetched from its source and written
 * as JSON lines under the cache root; later runs read that file. Samples are
 * streamed from disk so large datasets never sit in memory during translation.
 */

use log::info;
use serde::de::IgnoredAny;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Sample;
use super::hub::DatasetSource;
use super::registry::DatasetInfo;
use crate::errors::DatasetError;
use crate::file_utils::FileManager;

/// Resolves datasets to local cached copies, downloading them when missing
pub struct SampleStore {
    cache_root: PathBuf,
    source: Arc<dyn DatasetSource>,
}

impl SampleStore {
    /// Create a store caching under `cache_root` (e.g. `data/english`)
    pub fn new(cache_root: impl Into<PathBuf>, source: Arc<dyn DatasetSource>) -> Self {
        Self {
            cache_root: cache_root.into(),
            source,
        }
    }

    /// Cache file of a dataset
    pub fn cache_path(&self, name: &str) -> PathBuf {
        cache_file(&self.cache_root, name)
    }

    /// Open the cached copy of `info`, downloading and caching it first if needed
    pub async fn load_or_download(&self, info: &DatasetInfo) -> Result<SampleSet, DatasetError> {
        let path = self.cache_path(info.name);

        if FileManager::file_exists(&path) {
            info!("Loading local dataset from {}", path.display());
            return SampleSet::open(path);
        }

        info!("Downloading {} from Hugging Face: {}", info.name, info.huggingface_path);
        let samples = self.source.fetch_all(info).await?;
        let written = FileManager::write_jsonl_atomic(&path, &samples)?;
        info!("Saved full dataset ({} samples) to {}", written, path.display());

        SampleSet::open(path)
    }
}

/// Cache file of a dataset: `<cache_root>/<name>/<name>.jsonl`
pub fn cache_file(cache_root: &Path, name: &str) -> PathBuf {
    cache_root.join(name).join(format!("{}.jsonl", name))
}

/// A cached dataset on disk, read lazily in order
#[derive(Debug, Clone)]
pub struct SampleSet {
    path: PathBuf,
    len: usize,
}

impl SampleSet {
    /// Open a JSON lines file, checking every record up front.
    ///
    /// Blank lines are ignored. A line that is not a JSON object fails with its
    /// 1-based line number.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let path = path.into();
        let reader = BufReader::new(File::open(&path)?);

        let mut len = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            serde_json::from_str::<HashMap<String, IgnoredAny>>(&line).map_err(|e| {
                DatasetError::MalformedCache {
                    path: path.clone(),
                    line: index + 1,
                    reason: e.to_string(),
                }
            })?;
            len += 1;
        }

        Ok(Self { path, len })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the dataset has no samples
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cache file backing this set
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterate samples from position `start`; earlier samples are skipped unparsed
    pub fn iter_from(&self, start: usize) -> Result<SampleIter, DatasetError> {
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(SampleIter {
            path: self.path.clone(),
            lines: reader.lines(),
            line_number: 0,
            skip: start,
        })
    }
}

/// Iterator over the samples of a [`SampleSet`]
pub struct SampleIter {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
    skip: usize,
}

impl Iterator for SampleIter {
    type Item = Result<Sample, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }
            return Some(serde_json::from_str::<Sample>(&line).map_err(|e| {
                DatasetError::MalformedCache {
                    path: self.path.clone(),
                    line: self.line_number,
                    reason: e.to_string(),
                }
            }));
        }
    }
}
