//! Source — log file discovery and decoding.
//!
//! A log directory holds dated archives (`YYYY-MM-DD-N.log.gz`) plus one
//! uncompressed current log. Sources are returned oldest first so that
//! name bindings and open sessions build up in order.

pub mod discover;
pub mod read;

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

pub use discover::{discover, parse_archive_name};
pub use read::read_source;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decompression failed: {0}")]
    Decompress(String),
    #[error("Not a dated log archive: {0}")]
    InvalidFileName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceKind {
    /// gzip archive rotated out by the server
    Archive,
    /// The log the server is still writing
    Current,
}

/// One file to ingest, with the date its lines belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSource {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub kind: SourceKind,
    /// Rotation index within the day; 0 for the current log
    pub index: u32,
}

impl LogSource {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
