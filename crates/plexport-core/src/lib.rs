//! Plexport Core Library
//!
//! This crate exports Plex Media Server libraries (movies, TV shows,
//! music albums) to CSV for re-import into other catalog tools.
//!
//! # Features
//! - Cross-process run exclusion through a pid-stamped lock file
//! - Retrying HTTP transport with exponential backoff
//! - Cursor-based pagination merged into complete collections
//! - Per-media-type field normalization and fixed CSV schemas

pub mod client;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod lock;
pub mod normalize;
pub mod parser;
pub mod schema;
pub mod types;

// Re-export main types for convenience
pub use client::{ClientConfig, Pacer, PlexClient};
pub use error::{ExportError, Result};
pub use export::{
    output_file_name, ExportOptions, ExportOutcome, Exporter, ExporterConfig, RunSummary,
};
pub use fetcher::{PageProgress, PaginatedFetcher, ProgressCallback, DEFAULT_PAGE_SIZE};
pub use lock::{LockGuard, ProcessProbe, RunLock};
pub use types::{Collection, Library, LibraryKind, MediaItem, Page};
