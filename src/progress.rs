/*!
 * Resume cursor for append-only JSON lines output.
 *
 * The output file is the only progress record: the number of complete,
 * newline-terminated records it holds is the position of the next sample to
 * translate. A trailing fragment without a newline is what an interrupted append
 * leaves behind; it is never counted and [`ProgressTracker::recover`] cuts it
 * off before appending resumes.
 */

use log::{info, warn};
use serde::de::IgnoredAny;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use crate::errors::PipelineError;

/// Where a run picks up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePoint {
    /// Complete records already in the output
    pub records: usize,
    /// Bytes of unterminated tail removed from the output
    pub discarded_bytes: u64,
}

/// Scan result of an output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scan {
    records: usize,
    valid_len: u64,
    total_len: u64,
}

/// Computes the progress cursor of an output file
pub struct ProgressTracker;

impl ProgressTracker {
    /// Count complete records in `path`; a missing file counts as zero.
    ///
    /// An unterminated final fragment is ignored. A terminated line that is blank
    /// or not valid JSON fails with [`PipelineError::CorruptOutput`].
    pub fn count_existing(path: &Path) -> Result<usize, PipelineError> {
        Ok(Self::scan(path)?.map_or(0, |scan| scan.records))
    }

    /// Count complete records and truncate any unterminated tail
    pub fn recover(path: &Path) -> Result<ResumePoint, PipelineError> {
        let Some(scan) = Self::scan(path)? else {
            return Ok(ResumePoint { records: 0, discarded_bytes: 0 });
        };

        let discarded_bytes = scan.total_len - scan.valid_len;
        if discarded_bytes > 0 {
            warn!(
                "Discarding {} bytes of incomplete record at the end of {}",
                discarded_bytes,
                path.display()
            );
            let file = OpenOptions::new()
                .write(true)
                .open(path)
                .map_err(|source| io_error(path, source))?;
            file.set_len(scan.valid_len)
                .and_then(|_| file.sync_all())
                .map_err(|source| io_error(path, source))?;
        }

        if scan.records > 0 {
            info!("Resuming after {} existing records in {}", scan.records, path.display());
        }

        Ok(ResumePoint { records: scan.records, discarded_bytes })
    }

    fn scan(path: &Path) -> Result<Option<Scan>, PipelineError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_error(path, source)),
        };

        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        let mut records = 0;
        let mut valid_len = 0u64;
        let mut total_len = 0u64;

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|source| io_error(path, source))?;
            if read == 0 {
                break;
            }
            total_len += read as u64;

            if line.last() != Some(&b'\n') {
                break;
            }
            if serde_json::from_slice::<IgnoredAny>(&line).is_err() {
                return Err(PipelineError::CorruptOutput {
                    path: path.to_path_buf(),
                    line: records + 1,
                });
            }
            records += 1;
            valid_len = total_len;
        }

        Ok(Some(Scan { records, valid_len, total_len }))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::Io { path: PathBuf::from(path), source }
}
