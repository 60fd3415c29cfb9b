pub mod core;
pub mod heap;
pub mod partition;
pub mod record;
pub mod reduce;
pub mod scan;


pub use self::core::*;
pub use self::heap::BoundedTopK;
pub use self::partition::{ReaderPool, ScanStats, chunk_ranges};
pub use self::record::{LineFields, Ranked, Record, UNPARSED_SIZE, parse_size_field, split_line};
pub use self::reduce::{Partial, Reducer, Reduction, merge_top};
pub use self::scan::{Chunk, ChunkScan, ChunkStats, scan_chunk, scan_reader};
