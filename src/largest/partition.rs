use std::path::Path;

use crossbeam_channel::Sender;
use log::{debug, warn};
use rayon::prelude::*;

use super::record::Record;
use super::reduce::Partial;
use super::scan::{Chunk, ChunkScan, scan_chunk};

/// Byte ranges `[0, stride), [stride, 2*stride), ...` covering `[0, file_size)`.
/// The last range may extend past the end of the file.
pub fn chunk_ranges(file_size: u64, stride: u64) -> impl Iterator<Item = Chunk> {
    let stride = stride.max(1);
    std::iter::successors(Some(0u64), move |&start| start.checked_add(stride))
        .take_while(move |&start| start < file_size)
        .map(move |start| Chunk::new(start, start.saturating_add(stride)))
}

/// Totals across every chunk of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub chunks: u64,
    /// Chunks whose handle could not be opened, seeked or read.
    pub failed_chunks: u64,
    /// Chunks that scanned cleanly but owned no records.
    pub empty_chunks: u64,
    pub lines: u64,
    pub malformed: u64,
    pub bytes: u64,
}

impl ScanStats {
    fn from_scan(scan: &ChunkScan) -> Self {
        ScanStats {
            chunks: 1,
            failed_chunks: 0,
            empty_chunks: scan.records.is_empty() as u64,
            lines: scan.stats.lines,
            malformed: scan.stats.malformed,
            bytes: scan.stats.bytes,
        }
    }

    fn failed() -> Self {
        ScanStats {
            chunks: 1,
            failed_chunks: 1,
            ..ScanStats::default()
        }
    }

    fn combine(self, other: Self) -> Self {
        ScanStats {
            chunks: self.chunks + other.chunks,
            failed_chunks: self.failed_chunks + other.failed_chunks,
            empty_chunks: self.empty_chunks + other.empty_chunks,
            lines: self.lines + other.lines,
            malformed: self.malformed + other.malformed,
            bytes: self.bytes + other.bytes,
        }
    }
}

/// Runs chunk scanners on a dedicated pool. The pool's thread count is the
/// admission limit: at most that many chunks are being read at once, no
/// matter how many chunks the file has.
pub struct ReaderPool {
    pool: rayon::ThreadPool,
}

impl ReaderPool {
    pub fn new(max_scanners: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_scanners.max(1))
            .thread_name(|i| format!("flargest-scan-{}", i))
            .build()?;
        Ok(ReaderPool { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Scan every chunk of the file, publishing each non-empty partial result
    /// to `sink` as soon as its chunk completes. Returns once every scanner
    /// has finished. A chunk that fails is logged and contributes nothing.
    pub fn scan_all(
        &self,
        path: &Path,
        file_size: u64,
        stride: u64,
        k: usize,
        sink: &Sender<Partial<Record>>,
    ) -> ScanStats {
        let chunks: Vec<Chunk> = chunk_ranges(file_size, stride).collect();
        debug!(
            "scanning {} chunk(s) of {} bytes on {} reader(s)",
            chunks.len(),
            stride,
            self.threads()
        );

        self.pool.install(|| {
            chunks
                .into_par_iter()
                .map_with(sink.clone(), |sink, chunk| match scan_chunk(path, chunk, k) {
                    Ok(scan) => {
                        let stats = ScanStats::from_scan(&scan);
                        debug!(
                            "chunk {}..{}: {} line(s), {} malformed, {} candidate(s)",
                            chunk.start,
                            chunk.end,
                            scan.stats.lines,
                            scan.stats.malformed,
                            scan.records.len()
                        );
                        if !scan.records.is_empty() {
                            // The coordinator outlives every scanner; a send
                            // can only fail if it has already panicked.
                            let _ = sink.send(Partial::Scanned(scan.records));
                        }
                        stats
                    }
                    Err(e) => {
                        warn!(
                            "chunk {}..{} of {}: {}",
                            chunk.start,
                            chunk.end,
                            path.display(),
                            crate::common::io_error_msg(&e)
                        );
                        ScanStats::failed()
                    }
                })
                .reduce(ScanStats::default, ScanStats::combine)
        })
    }
}
