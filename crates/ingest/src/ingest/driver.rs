//! Driver — one ingestion run over an ordered list of log sources.
//!
//! ```text
//! LogSource ──read──▶ text ──lines──▶ LineParser ──▶ LogEvent
//!                                                      │
//!               IdentityResolver ◀── Authenticated ────┤
//!               SessionTracker   ◀── Joined / Left ────┤
//!               Store            ◀── every record ─────┘
//! ```
//!
//! Name bindings and open sessions live only as long as the [`Ingestor`];
//! a run always starts from the earliest file.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::{IngestError, IngestReport};
use crate::conf::CommitMode;
use crate::identity::IdentityResolver;
use crate::parser::{LineParser, LogEvent, TimeOfDay};
use crate::session::SessionTracker;
use crate::source::{read_source, LogSource};
use crate::store::{NewChatMessage, NewPlaySession, NewPlayerDeath, NewVillagerDeath, Store};
use crate::village::VillageIndex;

pub struct Ingestor<S: Store> {
    store: S,
    parser: LineParser,
    villages: VillageIndex,
    commit_mode: CommitMode,
    identities: IdentityResolver,
    sessions: SessionTracker,
    report: IngestReport,
}

impl<S: Store> Ingestor<S> {
    pub fn new(store: S, parser: LineParser, villages: VillageIndex, commit_mode: CommitMode) -> Self {
        Self {
            store,
            parser,
            villages,
            commit_mode,
            identities: IdentityResolver::new(),
            sessions: SessionTracker::new(),
            report: IngestReport::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    /// Ingest every source in order.
    ///
    /// Unreadable files are skipped with a warning; only storage failures
    /// abort the run.
    pub fn run(&mut self, sources: &[LogSource]) -> Result<IngestReport, IngestError> {
        for source in sources {
            match self.ingest_source(source) {
                Ok(()) => self.report.files_ingested += 1,
                Err(e @ IngestError::UnreadableFile { .. }) => {
                    tracing::warn!(error = %e, "Skipping log file, it is most likely corrupted");
                    self.report.record_drop(&e);
                }
                Err(e) => return Err(e),
            }
        }

        self.report.sessions_left_open = self.sessions.open_count() as u64;
        for (uuid, start) in self.sessions.dangling() {
            tracing::warn!(uuid = %uuid, since = %start, "Session still open at end of run");
        }
        Ok(self.report.clone())
    }

    pub fn ingest_source(&mut self, source: &LogSource) -> Result<(), IngestError> {
        let text = read_source(source).map_err(|e| IngestError::UnreadableFile {
            path: source.path.clone(),
            source: e,
        })?;

        let lines_before = self.report.lines_read;
        let written_before = self.report.records_written;
        tracing::info!(path = %source.path.display(), date = %source.date, "Ingesting log file");

        self.ingest_text(&text, source.date)?;

        tracing::info!(
            path = %source.path.display(),
            lines = self.report.lines_read - lines_before,
            records = self.report.records_written - written_before,
            "Finished log file"
        );
        Ok(())
    }

    /// Ingest the lines of one file, all dated `date`.
    pub fn ingest_text(&mut self, text: &str, date: NaiveDate) -> Result<(), IngestError> {
        if self.commit_mode == CommitMode::File {
            self.store.begin()?;
        }

        for line in text.split('\n').map(|l| l.trim_end_matches('\r')) {
            if line.is_empty() {
                continue;
            }
            if let Err(e) = self.ingest_line(line, date) {
                if self.commit_mode == CommitMode::File {
                    self.store.rollback()?;
                }
                return Err(e);
            }
        }

        if self.commit_mode == CommitMode::File {
            self.store.commit()?;
        }
        Ok(())
    }

    /// Parse and apply one line. Recoverable errors are counted, not returned.
    pub fn ingest_line(&mut self, line: &str, date: NaiveDate) -> Result<(), IngestError> {
        self.report.lines_read += 1;

        let Some(parsed) = self.parser.parse_line(line) else {
            tracing::trace!(line = %line, "Unparseable line");
            self.report.lines_unparsed += 1;
            return Ok(());
        };
        let Some(event) = self.parser.event(&parsed) else {
            self.report.lines_ignored += 1;
            return Ok(());
        };

        let result = timestamp(date, parsed.time).and_then(|time| {
            self.report.record_event(event.kind());
            match self.commit_mode {
                CommitMode::Line => self.in_transaction(|this| this.apply(&event, time)),
                CommitMode::File => self.apply(&event, time),
            }
        });

        match result {
            Err(e) if e.is_recoverable() => {
                tracing::debug!(error = %e, event = event.kind().as_str(), "Dropping event");
                self.report.record_drop(&e);
                Ok(())
            }
            other => other,
        }
    }

    fn in_transaction<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, IngestError>,
    ) -> Result<T, IngestError> {
        self.store.begin()?;
        match f(self) {
            Ok(value) => {
                self.store.commit()?;
                Ok(value)
            }
            Err(e) => {
                self.store.rollback()?;
                Err(e)
            }
        }
    }

    fn apply(&mut self, event: &LogEvent<'_>, time: DateTime<Utc>) -> Result<(), IngestError> {
        match *event {
            LogEvent::Authenticated { name, uuid } => {
                self.identities.resolve_or_create(&mut self.store, name, uuid)?;
            }
            LogEvent::Joined { name } => {
                let uuid = self.identities.uuid_for(name)?;
                if let Some(previous) = self.sessions.open_as(name, uuid, time) {
                    tracing::debug!(player = %name, previous = %previous, "Join without leave, replacing open session");
                    self.report.sessions_overwritten += 1;
                }
            }
            LogEvent::Left { name } => {
                // The uuid the name joined as; the binding may have moved on
                // to a newer login under the same name.
                let uuid = match self.sessions.take_joined_as(name) {
                    Some(uuid) => uuid,
                    None => self.identities.uuid_for(name)?.to_string(),
                };
                let session = self.sessions.close(&uuid, time)?;
                let player = self.identities.lookup_by_uuid(&self.store, &session.uuid)?;
                if session.is_negative() {
                    tracing::warn!(
                        player = %player.username,
                        start = %session.start,
                        end = %session.end,
                        "Session ends before it starts"
                    );
                    self.report.negative_sessions += 1;
                }
                self.store.insert_session(&NewPlaySession {
                    player_id: player.id,
                    start_time: session.start,
                    end_time: session.end,
                })?;
                self.report.records_written += 1;
            }
            LogEvent::VillagerDied { had_profession, data, message } => {
                self.store.insert_villager_death(&NewVillagerDeath {
                    time,
                    had_profession,
                    villager_data: data.to_string(),
                    village_name: self.villages.locate(data).map(str::to_string),
                    message: message.to_string(),
                })?;
                self.report.records_written += 1;
            }
            LogEvent::Chat { name, message } => {
                let player = self.identities.lookup_by_current_name(&self.store, name)?;
                self.store.insert_chat_message(&NewChatMessage {
                    player_id: player.id,
                    time,
                    message: message.to_string(),
                })?;
                self.report.records_written += 1;
            }
            LogEvent::PlayerDied { name, message } => {
                let player = self.identities.lookup_by_current_name(&self.store, name)?;
                self.store.insert_player_death(&NewPlayerDeath {
                    player_id: player.id,
                    time,
                    message: message.to_string(),
                })?;
                self.report.records_written += 1;
            }
        }
        Ok(())
    }
}

/// Log times are taken as UTC.
fn timestamp(date: NaiveDate, time: TimeOfDay) -> Result<DateTime<Utc>, IngestError> {
    time.on(date)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| {
            IngestError::UnparseableLine(format!(
                "{:02}:{:02}:{:02} is not a clock time",
                time.hour, time.minute, time.second
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::VillageConfig;
    use crate::parser::model::EventKind;
    use crate::parser::DeathClassifier;
    use crate::source::SourceKind;
    use crate::store::{MemoryStore, RecordCounts, SqliteStore};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::path::Path;

    const STEVE: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";
    const ALEX: &str = "853c80ef-3c37-49fd-aa49-938b674adae6";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, hour, minute, 0).unwrap()
    }

    fn ingestor<S: Store>(store: S, commit_mode: CommitMode) -> Ingestor<S> {
        let parser = LineParser::new(DeathClassifier::builtin().unwrap());
        let villages = VillageIndex::new(
            vec![VillageConfig { name: "cuteville".to_string(), x: 0.0, z: 0.0 }],
            1000.0,
        );
        Ingestor::new(store, parser, villages, commit_mode)
    }

    fn auth(time: &str, name: &str, uuid: &str) -> String {
        format!("[{}] [User Authenticator #1/INFO]: UUID of player {} is {}", time, name, uuid)
    }

    fn server(time: &str, message: &str) -> String {
        format!("[{}] [Server thread/INFO]: {}", time, message)
    }

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn archive(dir: &Path, name: &str, text: &str) -> LogSource {
        let path = dir.join(name);
        std::fs::write(&path, gzip(text)).unwrap();
        let (date, index) = crate::source::parse_archive_name(name).unwrap();
        LogSource { path, date, kind: SourceKind::Archive, index }
    }

    #[test]
    fn test_join_chat_leave_round_trip() {
        let log = [
            auth("09:59:58", "Steve", STEVE),
            server("10:00:00", "Steve joined the game"),
            server("10:05:00", "<Steve> good morning"),
            server("10:30:00", "Steve left the game"),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(&log, date()).unwrap();
        let store = ing.store();

        assert_eq!(store.all_players().len(), 1);
        assert_eq!(store.sessions(), &[NewPlaySession { player_id: 1, start_time: at(10, 0), end_time: at(10, 30) }]);
        assert_eq!(store.chat_messages().len(), 1);
        assert_eq!(store.chat_messages()[0].time, at(10, 5));
        assert_eq!(store.chat_messages()[0].message, "good morning");
        assert!(store.player_deaths().is_empty());
        assert!(store.villager_deaths().is_empty());
        assert_eq!(ing.report().records_written, 2);
    }

    #[test]
    fn test_new_uuid_creates_identity() {
        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_line(&auth("10:00:00", "Steve", STEVE), date()).unwrap();

        let players = ing.store().all_players();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].uuid, STEVE);
        assert_eq!(players[0].username, "Steve");
        assert!(players[0].past_usernames.is_empty());
    }

    #[test]
    fn test_rename_appends_history_once() {
        let log = [
            auth("10:00:00", "Steve", STEVE),
            auth("11:00:00", "SteveTheGreat", STEVE),
            auth("12:00:00", "SteveTheGreat", STEVE),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(&log, date()).unwrap();

        let player = &ing.store().all_players()[0];
        assert_eq!(player.username, "SteveTheGreat");
        assert_eq!(player.past_usernames, vec!["Steve".to_string()]);
    }

    #[test]
    fn test_leave_without_join_is_dropped() {
        let log = [
            auth("10:00:00", "Steve", STEVE),
            server("10:30:00", "Steve left the game"),
            server("10:31:00", "<Steve> still here"),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(&log, date()).unwrap();

        assert!(ing.store().sessions().is_empty());
        assert_eq!(ing.store().chat_messages().len(), 1);
        assert_eq!(ing.report().dropped.no_open_session, 1);
    }

    #[test]
    fn test_double_join_keeps_last_start() {
        let log = [
            auth("09:00:00", "Steve", STEVE),
            server("09:00:01", "Steve joined the game"),
            server("10:00:00", "Steve joined the game"),
            server("10:30:00", "Steve left the game"),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(&log, date()).unwrap();

        let sessions = ing.store().sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].start_time, at(10, 0));
        assert_eq!(sessions[0].end_time, at(10, 30));
        assert_eq!(ing.report().sessions_overwritten, 1);
    }

    #[test]
    fn test_leave_closes_session_of_joining_uuid() {
        // A second login under the same name authenticates before the old
        // connection's leave line is written.
        let log = [
            auth("10:00:00", "Steve", "uuid-1"),
            server("10:00:01", "Steve joined the game"),
            auth("10:10:00", "Steve", "uuid-2"),
            server("10:10:01", "Steve left the game"),
            server("10:10:02", "Steve joined the game"),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(&log, date()).unwrap();

        let sessions = ing.store().sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].player_id, 1);
        assert_eq!(sessions[0].start_time, at(10, 0) + chrono::Duration::seconds(1));
        assert_eq!(sessions[0].end_time, at(10, 10) + chrono::Duration::seconds(1));
        assert_eq!(ing.report().dropped.no_open_session, 0);
        assert_eq!(ing.sessions.dangling().len(), 1);
        assert_eq!(ing.sessions.dangling()[0].0, "uuid-2");
    }

    #[test]
    fn test_unknown_player_events_are_dropped() {
        let log = [
            server("10:00:00", "Herobrine joined the game"),
            server("10:01:00", "<Herobrine> boo"),
            server("10:02:00", "Herobrine drowned"),
            server("10:03:00", "Herobrine left the game"),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(&log, date()).unwrap();

        assert_eq!(ing.store().counts().unwrap(), RecordCounts::default());
        assert_eq!(ing.report().dropped.unknown_player, 4);
    }

    #[test]
    fn test_player_death_uses_current_binding() {
        let log = [
            auth("10:00:00", "Steve", STEVE),
            auth("10:00:05", "Alex", ALEX),
            server("10:10:00", "Alex was slain by Steve"),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(&log, date()).unwrap();

        let deaths = ing.store().player_deaths();
        assert_eq!(deaths.len(), 1);
        assert_eq!(deaths[0].player_id, 2);
        assert_eq!(deaths[0].message, "Alex was slain by Steve");
        assert_eq!(deaths[0].time, at(10, 10));
    }

    #[test]
    fn test_villager_deaths() {
        let log = [
            server("11:00:00", "Villager abc[type=farmer] died, message: 'Villager was slain by Zombie'"),
            server(
                "11:05:00",
                "Villager axw['Bob'/77, l='ServerLevel[world]', x=12.50, y=64.00, z=-30.00] died, message: 'Bob was slain by Zombie'",
            ),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(&log, date()).unwrap();

        let deaths = ing.store().villager_deaths();
        assert_eq!(deaths.len(), 2);
        assert!(!deaths[0].had_profession);
        assert_eq!(deaths[0].villager_data, "type=farmer");
        assert_eq!(deaths[0].village_name, None);
        assert!(deaths[1].had_profession);
        assert_eq!(deaths[1].village_name.as_deref(), Some("cuteville"));
        assert_eq!(deaths[1].message, "Bob was slain by Zombie");
    }

    #[test]
    fn test_negative_session_is_persisted() {
        let log = [
            auth("23:00:00", "Steve", STEVE),
            server("23:00:01", "Steve joined the game"),
            server("01:00:00", "Steve left the game"),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(&log, date()).unwrap();

        assert_eq!(ing.store().sessions().len(), 1);
        assert_eq!(ing.report().negative_sessions, 1);
    }

    #[test]
    fn test_noise_lines_are_skipped() {
        let log = "\
[09:00:00] [Server thread/INFO]: Starting minecraft server version 1.18.1\r
java.lang.NullPointerException: oops\r
\tat net.minecraft.server.Main.main(SourceFile:1)\r
\r
[25:00:00] [Server thread/INFO]: Villager x[type=farmer] died, message: 'Villager drowned'\r
";
        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(log, date()).unwrap();

        let report = ing.report();
        assert_eq!(report.lines_read, 4);
        assert_eq!(report.lines_unparsed, 2);
        assert_eq!(report.lines_ignored, 1);
        assert_eq!(report.dropped.unparseable, 1);
        assert_eq!(report.events_of(EventKind::VillagerDied), 0);
        assert!(ing.store().villager_deaths().is_empty());
    }

    #[test]
    fn test_line_mode_commits_each_record() {
        let log = [
            auth("10:00:00", "Steve", STEVE),
            server("10:00:01", "Steve joined the game"),
            server("10:00:02", "Starting minecraft server version 1.18.1"),
            server("10:30:00", "Steve left the game"),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        ing.ingest_text(&log, date()).unwrap();
        assert_eq!(ing.store().commits(), 3);
        assert!(!ing.store().in_transaction());
    }

    #[test]
    fn test_file_mode_commits_once() {
        let log = [
            auth("10:00:00", "Steve", STEVE),
            server("10:00:01", "Steve joined the game"),
            server("10:30:00", "Steve left the game"),
        ]
        .join("\n");

        let mut ing = ingestor(MemoryStore::new(), CommitMode::File);
        ing.ingest_text(&log, date()).unwrap();
        assert_eq!(ing.store().commits(), 1);
        assert_eq!(ing.store().sessions().len(), 1);
    }

    #[test]
    fn test_state_carries_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            archive(
                dir.path(),
                "2024-01-05-1.log.gz",
                &[auth("23:50:00", "Steve", STEVE), server("23:50:01", "Steve joined the game")].join("\n"),
            ),
            archive(dir.path(), "2024-01-06-1.log.gz", &server("00:20:00", "Steve left the game")),
        ];

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        let report = ing.run(&sources).unwrap();

        assert_eq!(report.files_ingested, 2);
        let sessions = ing.store().sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].start_time, at(23, 50) + chrono::Duration::seconds(1));
        assert_eq!(sessions[0].end_time, Utc.with_ymd_and_hms(2024, 1, 6, 0, 20, 0).unwrap());
    }

    #[test]
    fn test_corrupt_archive_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let first = archive(dir.path(), "2024-01-05-1.log.gz", &auth("10:00:00", "Steve", STEVE));
        let corrupt_path = dir.path().join("2024-01-05-2.log.gz");
        std::fs::write(&corrupt_path, b"\x1f\x8b\x08\x00garbage").unwrap();
        let corrupt = LogSource { path: corrupt_path, date: date(), kind: SourceKind::Archive, index: 2 };
        let last = archive(dir.path(), "2024-01-05-3.log.gz", &auth("12:00:00", "Alex", ALEX));

        let mut ing = ingestor(SqliteStore::open_in_memory().unwrap(), CommitMode::Line);
        let report = ing.run(&[first, corrupt, last]).unwrap();

        // One skipped file is one "Skipping log file" warning.
        assert_eq!(report.files_ingested, 2);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(ing.store().counts().unwrap().players, 2);
    }

    #[test]
    fn test_dangling_sessions_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = archive(
            dir.path(),
            "2024-01-05-1.log.gz",
            &[auth("10:00:00", "Steve", STEVE), server("10:00:01", "Steve joined the game")].join("\n"),
        );

        let mut ing = ingestor(MemoryStore::new(), CommitMode::Line);
        let report = ing.run(&[source]).unwrap();
        assert_eq!(report.sessions_left_open, 1);
        assert!(ing.store().sessions().is_empty());
    }

    #[test]
    fn test_sqlite_round_trip() {
        let log = [
            auth("09:59:58", "Steve", STEVE),
            server("10:00:00", "Steve joined the game"),
            server("10:05:00", "<Steve> good morning"),
            server("10:20:00", "Steve fell from a high place"),
            server("10:30:00", "Steve left the game"),
        ]
        .join("\n");

        let mut ing = ingestor(SqliteStore::open_in_memory().unwrap(), CommitMode::File);
        ing.ingest_text(&log, date()).unwrap();

        let stats = ing.store().player_stats().unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].sessions, 1);
        assert_eq!(stats[0].playtime_secs, 30 * 60);
        assert_eq!(stats[0].deaths, 1);
        assert_eq!(stats[0].chat_messages, 1);
    }
}
