//! Error types for Plexport
//!
//! This module defines all error types used throughout the library.
//! Variants map one-to-one onto the failure kinds the export run has to
//! distinguish: transient network trouble (retried inside the client),
//! terminal server rejections, malformed XML, per-library preconditions
//! and cross-process lock contention.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Error type for Plexport operations
#[derive(Error, Debug)]
pub enum ExportError {
    /// Connection-level HTTP failure (already retried by the client)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A transient status kept coming back until the retry budget ran out
    #[error("server returned {status} for {url} after {attempts} attempts")]
    RetriesExhausted {
        status: StatusCode,
        url: String,
        attempts: u32,
    },

    /// Non-transient 4xx such as a bad token or unknown path; never retried
    #[error("server rejected request to {url}: {status}")]
    Rejected { status: StatusCode, url: String },

    /// Response body was not a well-formed MediaContainer document
    #[error("failed to parse server response: {0}")]
    Xml(String),

    /// Library declares a kind the exporter has no schema for
    #[error("library {key} has unsupported kind '{kind}'")]
    UnknownLibraryKind { key: String, kind: String },

    /// Output target exists and overwrite was not forced
    #[error("output file {} already exists (use force to overwrite)", .0.display())]
    OutputExists(PathBuf),

    /// CSV serialization failure
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure while creating or writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Another live process holds the run lock
    #[error("another instance is running (lock {} held by pid {pid})", .path.display())]
    LockBusy { path: PathBuf, pid: u32 },
}

impl ExportError {
    /// Whether this failure means another exporter instance is active.
    ///
    /// The caller maps this onto a dedicated exit code so cron-style
    /// wrappers can tell contention apart from real export failures.
    pub fn is_lock_contention(&self) -> bool {
        matches!(self, ExportError::LockBusy { .. })
    }
}

/// Result type alias for Plexport operations
pub type Result<T> = std::result::Result<T, ExportError>;
