use std::collections::BTreeMap;

use serde::Serialize;

use super::IngestError;
use crate::parser::model::EventKind;

/// Events that were recognised but not persisted, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub unknown_player: u64,
    pub no_open_session: u64,
    pub unparseable: u64,
}

impl DropCounts {
    pub fn total(&self) -> u64 {
        self.unknown_player + self.no_open_session + self.unparseable
    }
}

/// Totals for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files_ingested: u64,
    pub files_skipped: u64,
    pub lines_read: u64,
    /// Lines outside the `[HH:MM:SS] [source]: message` grammar
    pub lines_unparsed: u64,
    /// Well-formed lines that carry no event
    pub lines_ignored: u64,
    /// Events with a valid clock time, by kind
    pub events: BTreeMap<&'static str, u64>,
    pub dropped: DropCounts,
    pub records_written: u64,
    pub negative_sessions: u64,
    pub sessions_overwritten: u64,
    pub sessions_left_open: u64,
}

impl IngestReport {
    pub fn record_event(&mut self, kind: EventKind) {
        *self.events.entry(kind.as_str()).or_insert(0) += 1;
    }

    pub fn events_of(&self, kind: EventKind) -> u64 {
        self.events.get(kind.as_str()).copied().unwrap_or(0)
    }

    /// Count a recoverable error against its reason.
    pub fn record_drop(&mut self, error: &IngestError) {
        match error {
            IngestError::UnknownPlayer(_) => self.dropped.unknown_player += 1,
            IngestError::NoOpenSession(_) => self.dropped.no_open_session += 1,
            IngestError::UnparseableLine(_) => self.dropped.unparseable += 1,
            IngestError::UnreadableFile { .. } => self.files_skipped += 1,
            IngestError::Store(_) => {}
        }
    }
}
