//! Chunk scanner: turns one byte range of the input into a partial top-K.
//!
//! Chunk boundaries are arbitrary byte offsets and usually fall mid-line.
//! Ownership rule: chunk `[start, end)` owns every line whose first byte lies
//! in `(start, end]` (`[0, end]` for the first chunk). The left chunk keeps
//! reading while the next line starts at or before `end`, which consumes the
//! one line straddling (or beginning at) the boundary. The right chunk seeks
//! to `start` and throws away everything up to the first newline, which is
//! exactly that line's tail. Each line is counted once.

use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::common::io::open_noatime;

use super::heap::BoundedTopK;
use super::record::{Record, split_line, trim_line_end};

/// 256KB read buffer per chunk handle. Large enough to keep read() syscalls
/// rare, small enough that 100 concurrent scanners stay well under 32MB.
const READ_BUF_SIZE: usize = 256 * 1024;

/// Typical line length hint for the reusable line buffer.
const LINE_BUF_SIZE: usize = 256;

/// Half-open byte range `[start, end)` of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: u64,
    pub end: u64,
}

impl Chunk {
    pub fn new(start: u64, end: u64) -> Self {
        Chunk { start, end }
    }
}

/// Per-chunk counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Non-empty lines fed to the selector.
    pub lines: u64,
    /// Lines whose size field was missing or unparsable.
    pub malformed: u64,
    /// Bytes consumed, including the discarded partial first line.
    pub bytes: u64,
}

/// Result of scanning one chunk: at most K records, largest first.
#[derive(Debug, Clone, Default)]
pub struct ChunkScan {
    pub records: Vec<Record>,
    pub stats: ChunkStats,
}

/// Scan `chunk` of the file at `path` through a handle owned by this call.
pub fn scan_chunk(path: &Path, chunk: Chunk, k: usize) -> io::Result<ChunkScan> {
    let file = open_noatime(path)?;
    scan_reader(BufReader::with_capacity(READ_BUF_SIZE, file), chunk, k)
}

/// Scan `chunk` from any seekable buffered source.
pub fn scan_reader<R: BufRead + Seek>(mut reader: R, chunk: Chunk, k: usize) -> io::Result<ChunkScan> {
    let mut line = Vec::with_capacity(LINE_BUF_SIZE);
    let mut stats = ChunkStats::default();

    // Offset of the next unread line.
    let mut pos = chunk.start;
    if chunk.start > 0 {
        reader.seek(SeekFrom::Start(chunk.start))?;
        let skipped = reader.read_until(b'\n', &mut line)?;
        if skipped == 0 || line.last() != Some(&b'\n') {
            // No line starts inside this chunk.
            stats.bytes = skipped as u64;
            return Ok(ChunkScan {
                records: Vec::new(),
                stats,
            });
        }
        pos += skipped as u64;
        stats.bytes += skipped as u64;
    }

    let mut top = BoundedTopK::new(k);
    while pos <= chunk.end {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            break;
        }
        pos += n as u64;
        stats.bytes += n as u64;

        let content = trim_line_end(&line);
        if content.is_empty() {
            continue;
        }
        stats.lines += 1;

        let fields = split_line(content);
        if fields.size.is_none() {
            stats.malformed += 1;
        }
        let size = fields.size_or_default();
        // Only allocate the identifier if the record survives selection.
        if top.admits(size) {
            top.insert(Record::from_bytes(fields.link, size));
        }
    }

    Ok(ChunkScan {
        records: top.into_sorted_vec(),
        stats,
    })
}
