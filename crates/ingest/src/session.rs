//! Session — pairs join and leave events per player.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::ingest::IngestError;

/// A join matched with its leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedSession {
    pub uuid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ClosedSession {
    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Leave stamped before join, e.g. a session spanning midnight in the
    /// current log. Kept as-is; flagged only for reporting.
    pub fn is_negative(&self) -> bool {
        self.end < self.start
    }
}

/// Open sessions keyed by uuid. At most one per player.
///
/// Also remembers which uuid each name joined as, so a leave closes the
/// session of the connection that joined even if the name was rebound since.
#[derive(Debug, Default)]
pub struct SessionTracker {
    open: HashMap<String, DateTime<Utc>>,
    joined_as: HashMap<String, String>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a join. A second join before the leave replaces the earlier
    /// start time; the earlier session is lost.
    pub fn open(&mut self, uuid: &str, time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.open.insert(uuid.to_string(), time)
    }

    /// Record a join by `name`, resolved to `uuid` at join time.
    pub fn open_as(&mut self, name: &str, uuid: &str, time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.joined_as.insert(name.to_string(), uuid.to_string());
        self.open(uuid, time)
    }

    /// The uuid `name` joined as, consumed by the leave that ends it.
    pub fn take_joined_as(&mut self, name: &str) -> Option<String> {
        self.joined_as.remove(name)
    }

    /// Consume the open session for `uuid`.
    pub fn close(&mut self, uuid: &str, time: DateTime<Utc>) -> Result<ClosedSession, IngestError> {
        let start = self
            .open
            .remove(uuid)
            .ok_or_else(|| IngestError::NoOpenSession(uuid.to_string()))?;

        Ok(ClosedSession {
            uuid: uuid.to_string(),
            start,
            end: time,
        })
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Sessions still waiting for a leave, oldest start first.
    pub fn dangling(&self) -> Vec<(&str, DateTime<Utc>)> {
        let mut open: Vec<(&str, DateTime<Utc>)> =
            self.open.iter().map(|(uuid, start)| (uuid.as_str(), *start)).collect();
        open.sort_by_key(|(_, start)| *start);
        open
    }
}
