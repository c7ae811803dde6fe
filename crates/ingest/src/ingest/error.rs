use std::path::PathBuf;

use thiserror::Error;

use crate::source::SourceError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unreadable log file {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: SourceError,
    },

    #[error("Unparseable line: {0}")]
    UnparseableLine(String),

    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("No open session for player {0}")]
    NoOpenSession(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Whether the run can continue past this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, IngestError::Store(_))
    }
}
