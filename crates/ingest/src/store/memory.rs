//! Memory — in-memory test double for [`Store`].
//!
//! Keeps every table in a `Vec`. `begin` takes a snapshot that `rollback`
//! restores, so commit granularity can be exercised without SQLite.

use std::collections::HashMap;

use super::model::*;
use super::{Result, Store, StoreError};

#[derive(Debug, Clone, Default)]
struct Tables {
    players: Vec<Player>,
    sessions: Vec<NewPlaySession>,
    player_deaths: Vec<NewPlayerDeath>,
    villager_deaths: Vec<NewVillagerDeath>,
    chat_messages: Vec<NewChatMessage>,
}

/// A fake store for deterministic testing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    snapshot: Option<Tables>,
    commits: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_players(&self) -> &[Player] {
        &self.tables.players
    }

    pub fn sessions(&self) -> &[NewPlaySession] {
        &self.tables.sessions
    }

    pub fn player_deaths(&self) -> &[NewPlayerDeath] {
        &self.tables.player_deaths
    }

    pub fn villager_deaths(&self) -> &[NewVillagerDeath] {
        &self.tables.villager_deaths
    }

    pub fn chat_messages(&self) -> &[NewChatMessage] {
        &self.tables.chat_messages
    }

    /// Number of successful commits so far.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl Store for MemoryStore {
    fn begin(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            return Err(StoreError::Transaction("transaction already open".to_string()));
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.snapshot.take().is_none() {
            return Err(StoreError::Transaction("no transaction is active".to_string()));
        }
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if let Some(snapshot) = self.snapshot.take() {
            self.tables = snapshot;
        }
        Ok(())
    }

    fn player_by_uuid(&self, uuid: &str) -> Result<Option<Player>> {
        Ok(self.tables.players.iter().find(|p| p.uuid == uuid).cloned())
    }

    fn insert_player(&mut self, uuid: &str, username: &str) -> Result<Player> {
        if self.tables.players.iter().any(|p| p.uuid == uuid) {
            return Err(StoreError::Transaction(format!("duplicate uuid {}", uuid)));
        }
        let player = Player {
            id: self.tables.players.len() as i64 + 1,
            uuid: uuid.to_string(),
            username: username.to_string(),
            past_usernames: Vec::new(),
        };
        self.tables.players.push(player.clone());
        Ok(player)
    }

    fn update_player_names(&mut self, player: &Player) -> Result<()> {
        let stored = self
            .tables
            .players
            .iter_mut()
            .find(|p| p.id == player.id)
            .ok_or(StoreError::PlayerNotFound(player.id))?;
        stored.username = player.username.clone();
        stored.past_usernames = player.past_usernames.clone();
        Ok(())
    }

    fn players(&self) -> Result<Vec<Player>> {
        Ok(self.tables.players.clone())
    }

    fn insert_session(&mut self, session: &NewPlaySession) -> Result<i64> {
        self.tables.sessions.push(session.clone());
        Ok(self.tables.sessions.len() as i64)
    }

    fn insert_player_death(&mut self, death: &NewPlayerDeath) -> Result<i64> {
        self.tables.player_deaths.push(death.clone());
        Ok(self.tables.player_deaths.len() as i64)
    }

    fn insert_villager_death(&mut self, death: &NewVillagerDeath) -> Result<i64> {
        self.tables.villager_deaths.push(death.clone());
        Ok(self.tables.villager_deaths.len() as i64)
    }

    fn insert_chat_message(&mut self, message: &NewChatMessage) -> Result<i64> {
        self.tables.chat_messages.push(message.clone());
        Ok(self.tables.chat_messages.len() as i64)
    }

    fn counts(&self) -> Result<RecordCounts> {
        Ok(RecordCounts {
            players: self.tables.players.len() as u64,
            sessions: self.tables.sessions.len() as u64,
            player_deaths: self.tables.player_deaths.len() as u64,
            villager_deaths: self.tables.villager_deaths.len() as u64,
            chat_messages: self.tables.chat_messages.len() as u64,
        })
    }

    fn player_stats(&self) -> Result<Vec<PlayerStats>> {
        let mut deaths: HashMap<i64, u64> = HashMap::new();
        for death in &self.tables.player_deaths {
            *deaths.entry(death.player_id).or_insert(0) += 1;
        }
        let mut messages: HashMap<i64, u64> = HashMap::new();
        for message in &self.tables.chat_messages {
            *messages.entry(message.player_id).or_insert(0) += 1;
        }

        Ok(self
            .tables
            .players
            .iter()
            .map(|player| {
                let sessions: Vec<&NewPlaySession> = self
                    .tables
                    .sessions
                    .iter()
                    .filter(|s| s.player_id == player.id)
                    .collect();
                PlayerStats {
                    player: player.clone(),
                    deaths: deaths.get(&player.id).copied().unwrap_or(0),
                    sessions: sessions.len() as u64,
                    playtime_secs: sessions.iter().map(|s| s.length().num_seconds()).sum(),
                    chat_messages: messages.get(&player.id).copied().unwrap_or(0),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_restores_snapshot() {
        let mut store = MemoryStore::new();
        store.insert_player("uuid-1", "Steve").unwrap();

        store.begin().unwrap();
        store.insert_player("uuid-2", "Alex").unwrap();
        assert_eq!(store.all_players().len(), 2);
        store.rollback().unwrap();

        assert_eq!(store.all_players().len(), 1);
        assert!(!store.in_transaction());
    }

    #[test]
    fn test_commit_requires_begin() {
        let mut store = MemoryStore::new();
        assert!(store.commit().is_err());

        store.begin().unwrap();
        assert!(store.begin().is_err());
        store.commit().unwrap();
        assert_eq!(store.commits(), 1);
    }

    #[test]
    fn test_update_player_names() {
        let mut store = MemoryStore::new();
        let mut player = store.insert_player("uuid-1", "Steve").unwrap();
        player.rename("Alex");
        store.update_player_names(&player).unwrap();

        let stored = store.player_by_uuid("uuid-1").unwrap().unwrap();
        assert_eq!(stored.username, "Alex");
        assert_eq!(stored.past_usernames, vec!["Steve".to_string()]);
    }
}
