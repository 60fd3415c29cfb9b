#![allow(clippy::doc_lazy_continuation)]

/// Use mimalloc as the global allocator for all binaries.
/// Every scanned line that survives selection allocates its identifier,
/// and scanner threads allocate concurrently; mimalloc's thread-local
/// caching keeps that off the hot path.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod common;
pub mod largest;
