use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A stable player identity keyed by the platform UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub id: i64,
    pub uuid: String,
    /// Current display name
    pub username: String,
    /// Prior display names, oldest first
    pub past_usernames: Vec<String>,
}

impl Player {
    /// Switch to `name`, moving the current name into history.
    ///
    /// Returns false when `name` is already current.
    pub fn rename(&mut self, name: &str) -> bool {
        if self.username == name {
            return false;
        }
        let previous = std::mem::replace(&mut self.username, name.to_string());
        self.past_usernames.push(previous);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPlaySession {
    pub player_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl NewPlaySession {
    /// May be negative; the store keeps such sessions as written.
    pub fn length(&self) -> Duration {
        self.end_time - self.start_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPlayerDeath {
    pub player_id: i64,
    pub time: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVillagerDeath {
    pub time: DateTime<Utc>,
    pub had_profession: bool,
    pub villager_data: String,
    pub village_name: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChatMessage {
    pub player_id: i64,
    pub time: DateTime<Utc>,
    pub message: String,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub players: u64,
    pub sessions: u64,
    pub player_deaths: u64,
    pub villager_deaths: u64,
    pub chat_messages: u64,
}

/// Per-player totals for the end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub player: Player,
    pub deaths: u64,
    pub sessions: u64,
    pub playtime_secs: i64,
    pub chat_messages: u64,
}
