//! Entry point for flargest: find the K largest records of a file.
//!
//! Pipeline:
//! - The file is cut into fixed-stride byte ranges ("chunks")
//! - A reader pool scans chunks concurrently, each with its own handle and a
//!   bounded min-heap, and publishes each chunk's top-K as soon as it is done
//! - The calling thread runs the reduction coordinator, pairing partial
//!   results as they arrive and merging them on a separate pool
//!
//! Memory is O(K) per in-flight chunk or merge, independent of file size.

use std::io;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::common::io::open_noatime;
use crate::common::io_error_msg;

use super::partition::{ReaderPool, ScanStats};
use super::record::Record;
use super::reduce::Reducer;

/// Default number of records to report.
pub const DEFAULT_RESULT_SIZE: usize = 10;

/// Default chunk stride in bytes.
pub const DEFAULT_CHUNK_SIZE: u64 = 100_000_000;

/// Default number of chunks scanned at once.
pub const DEFAULT_MAX_SCANNERS: usize = 100;

/// Default number of merges run at once.
pub const DEFAULT_MAX_MERGES: usize = 100;

/// Configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LargestConfig {
    /// Number of records to keep (K).
    pub k: usize,
    /// Chunk stride in bytes.
    pub chunk_size: u64,
    pub max_scanners: usize,
    pub max_merges: usize,
}

impl Default for LargestConfig {
    fn default() -> Self {
        LargestConfig {
            k: DEFAULT_RESULT_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_scanners: DEFAULT_MAX_SCANNERS,
            max_merges: DEFAULT_MAX_MERGES,
        }
    }
}

impl LargestConfig {
    pub fn with_k(k: usize) -> Self {
        LargestConfig {
            k,
            ..LargestConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), LargestError> {
        if self.k == 0 {
            return Err(LargestError::Config("result count must be at least 1".into()));
        }
        if self.chunk_size == 0 {
            return Err(LargestError::Config("chunk size must be at least 1 byte".into()));
        }
        if self.max_scanners == 0 {
            return Err(LargestError::Config("need at least 1 reader".into()));
        }
        if self.max_merges == 0 {
            return Err(LargestError::Config("need at least 1 merger".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LargestError {
    #[error("cannot open '{}': {}", .path.display(), io_error_msg(.source))]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot stat '{}': {}", .path.display(), io_error_msg(.source))]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{}' is not a regular file", .path.display())]
    NotRegular { path: PathBuf },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// The file held no records. Not a failure of the run itself.
    #[error("no results")]
    NoResults,
}

impl LargestError {
    /// Everything except [`LargestError::NoResults`] aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LargestError::NoResults)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct LargestReport {
    /// At most K records, largest size first. Order among equal sizes is
    /// unspecified.
    pub records: Vec<Record>,
    pub scan: ScanStats,
    /// Pairwise merges performed by the reduction.
    pub merges: u64,
}

impl LargestReport {
    pub fn links(&self) -> Vec<String> {
        self.records.iter().map(|r| r.link().to_string()).collect()
    }
}

/// Identifiers of the `k` records with the largest size, largest first,
/// using default chunking and concurrency.
pub fn find_largest(path: impl AsRef<Path>, k: usize) -> Result<Vec<String>, LargestError> {
    let report = find_largest_with(path.as_ref(), &LargestConfig::with_k(k))?;
    Ok(report.records.into_iter().map(Record::into_link).collect())
}

/// Full run with explicit configuration.
///
/// Setup failures (bad config, file cannot be opened or stat'd, not a
/// regular file) are returned immediately. Chunks that fail to read are
/// logged and skipped. `Err(NoResults)` if no chunk produced a record.
pub fn find_largest_with(path: &Path, config: &LargestConfig) -> Result<LargestReport, LargestError> {
    config.validate()?;

    let file_size = {
        let file = open_noatime(path).map_err(|source| LargestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let meta = file.metadata().map_err(|source| LargestError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.file_type().is_file() {
            return Err(LargestError::NotRegular {
                path: path.to_path_buf(),
            });
        }
        meta.len()
    };

    let readers = ReaderPool::new(config.max_scanners)?;
    let reducer = Reducer::<Record>::new(config.k, config.max_merges)?;
    let sink = reducer.sender();
    let (finished_tx, finished_rx) = crossbeam_channel::bounded::<ScanStats>(1);

    let reduction = std::thread::scope(|s| {
        s.spawn(move || {
            let stats = readers.scan_all(path, file_size, config.chunk_size, config.k, &sink);
            // Every scan result is already in the channel at this point.
            let _ = finished_tx.send(stats);
        });
        reducer.run(finished_rx)
    });

    let scan = reduction.finished;
    info!(
        "{}: {} bytes, {} chunk(s) ({} failed, {} empty), {} line(s), {} malformed, {} merge(s)",
        path.display(),
        file_size,
        scan.chunks,
        scan.failed_chunks,
        scan.empty_chunks,
        scan.lines,
        scan.malformed,
        reduction.merges
    );

    match reduction.result {
        Some(records) => Ok(LargestReport {
            records,
            scan,
            merges: reduction.merges,
        }),
        None => Err(LargestError::NoResults),
    }
}
