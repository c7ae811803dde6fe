use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::model::*;
use super::{Result, Store, StoreError};

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        super::schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn count(&self, table: &str) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn counts_by_user(&self, table: &str) -> Result<HashMap<i64, u64>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT user_id, COUNT(*) FROM {} GROUP BY user_id", table))?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;

        let mut counts = HashMap::new();
        for row in rows {
            let (user_id, count) = row?;
            counts.insert(user_id, count as u64);
        }
        Ok(counts)
    }
}

fn decode_names(raw: &str) -> std::result::Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(raw)
}

impl Store for SqliteStore {
    fn begin(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            return Err(StoreError::Transaction("transaction already open".to_string()));
        }
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn player_by_uuid(&self, uuid: &str) -> Result<Option<Player>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, minecraft_uuid, username, past_usernames FROM users
                 WHERE minecraft_uuid = ?1",
                params![uuid],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((id, uuid, username, past)) => Ok(Some(Player {
                id,
                uuid,
                username,
                past_usernames: decode_names(&past)?,
            })),
            None => Ok(None),
        }
    }

    fn insert_player(&mut self, uuid: &str, username: &str) -> Result<Player> {
        self.conn.execute(
            "INSERT INTO users (username, past_usernames, minecraft_uuid) VALUES (?1, '[]', ?2)",
            params![username, uuid],
        )?;
        Ok(Player {
            id: self.conn.last_insert_rowid(),
            uuid: uuid.to_string(),
            username: username.to_string(),
            past_usernames: Vec::new(),
        })
    }

    fn update_player_names(&mut self, player: &Player) -> Result<()> {
        let past = serde_json::to_string(&player.past_usernames)?;
        let updated = self.conn.execute(
            "UPDATE users SET username = ?1, past_usernames = ?2 WHERE id = ?3",
            params![player.username, past, player.id],
        )?;
        if updated == 0 {
            return Err(StoreError::PlayerNotFound(player.id));
        }
        Ok(())
    }

    fn players(&self) -> Result<Vec<Player>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, minecraft_uuid, username, past_usernames FROM users ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut players = Vec::new();
        for row in rows {
            let (id, uuid, username, past) = row?;
            players.push(Player {
                id,
                uuid,
                username,
                past_usernames: decode_names(&past)?,
            });
        }
        Ok(players)
    }

    fn insert_session(&mut self, session: &NewPlaySession) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (start_time, end_time, user_id) VALUES (?1, ?2, ?3)",
            params![session.start_time, session.end_time, session.player_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_player_death(&mut self, death: &NewPlayerDeath) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO user_deaths (time, user_id, message) VALUES (?1, ?2, ?3)",
            params![death.time, death.player_id, death.message],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_villager_death(&mut self, death: &NewVillagerDeath) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO villager_deaths (time, had_profession, villager_data, village_name, message)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                death.time,
                death.had_profession,
                death.villager_data,
                death.village_name,
                death.message
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_chat_message(&mut self, message: &NewChatMessage) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO messages (time, user_id, message) VALUES (?1, ?2, ?3)",
            params![message.time, message.player_id, message.message],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn counts(&self) -> Result<RecordCounts> {
        Ok(RecordCounts {
            players: self.count("users")?,
            sessions: self.count("sessions")?,
            player_deaths: self.count("user_deaths")?,
            villager_deaths: self.count("villager_deaths")?,
            chat_messages: self.count("messages")?,
        })
    }

    fn player_stats(&self) -> Result<Vec<PlayerStats>> {
        let deaths = self.counts_by_user("user_deaths")?;
        let messages = self.counts_by_user("messages")?;

        let mut sessions: HashMap<i64, (u64, i64)> = HashMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, start_time, end_time FROM sessions")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, DateTime<Utc>>(1)?,
                row.get::<_, DateTime<Utc>>(2)?,
            ))
        })?;
        for row in rows {
            let (user_id, start, end) = row?;
            let entry = sessions.entry(user_id).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += (end - start).num_seconds();
        }

        Ok(self
            .players()?
            .into_iter()
            .map(|player| {
                let (session_count, playtime_secs) =
                    sessions.get(&player.id).copied().unwrap_or((0, 0));
                PlayerStats {
                    deaths: deaths.get(&player.id).copied().unwrap_or(0),
                    chat_messages: messages.get(&player.id).copied().unwrap_or(0),
                    sessions: session_count,
                    playtime_secs,
                    player,
                }
            })
            .collect())
    }
}
