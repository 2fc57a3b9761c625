use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::PipelineError;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @creates: Parent directory of a file path
    pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
        match path.as_ref().parent() {
            Some(parent) => Self::ensure_dir(parent),
            None => Ok(()),
        }
    }

    /// Write records as JSON lines, replacing `path` only once every line is on disk
    ///
    /// The records are streamed into a temporary file next to the destination and
    /// renamed over it, so readers never observe a partially written file.
    pub fn write_jsonl_atomic<P, T, I>(path: P, records: I) -> io::Result<usize>
    where
        P: AsRef<Path>,
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let path = path.as_ref();
        Self::ensure_parent_dir(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let temp = NamedTempFile::new_in(&dir)?;
        let mut written = 0;
        {
            let mut writer = BufWriter::new(temp.as_file());
            for record in records {
                serde_json::to_writer(&mut writer, &record)?;
                writer.write_all(b"\n")?;
                written += 1;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        Ok(written)
    }
}

/// Append-only JSON lines writer with per-record durability
///
/// Every call to [`JsonlAppender::append`] writes exactly one terminated line and
/// syncs it to disk before returning.
#[derive(Debug)]
pub struct JsonlAppender {
    path: PathBuf,
    file: File,
    records_written: usize,
}

impl JsonlAppender {
    /// Open `path` for appending, creating it and its parent directory if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| PipelineError::Io { path: path.clone(), source };

        FileManager::ensure_parent_dir(&path).map_err(io_err)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        Ok(Self { path, file, records_written: 0 })
    }

    /// Serialize `record` as one line, then flush and sync it
    pub fn append<T: Serialize>(&mut self, record: &T) -> Result<(), PipelineError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let result = self
            .file
            .write_all(&line)
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data());
        result.map_err(|source| PipelineError::Io { path: self.path.clone(), source })?;

        self.records_written += 1;
        Ok(())
    }

    /// Number of records appended through this handle
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
