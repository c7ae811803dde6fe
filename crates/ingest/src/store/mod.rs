//! Store — the relational sink the ingestion driver writes through.
//!
//! Every domain module reaches storage through the [`Store`] trait.
//! `sqlite.rs` provides the rusqlite-backed implementation,
//! `memory.rs` an in-memory test double.

pub mod model;
pub mod schema;
pub mod sqlite;
pub mod memory;

use thiserror::Error;

pub use model::{
    NewChatMessage, NewPlaySession, NewPlayerDeath, NewVillagerDeath, Player, PlayerStats,
    RecordCounts,
};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to encode username history: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("Player not found: {0}")]
    PlayerNotFound(i64),
    #[error("Transaction error: {0}")]
    Transaction(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Synchronous storage interface.
///
/// Records are append-only except for a player's name fields.
pub trait Store {
    // ── Transactions ────────────────────────────────────────────

    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;

    // ── Players ─────────────────────────────────────────────────

    fn player_by_uuid(&self, uuid: &str) -> Result<Option<Player>>;
    fn insert_player(&mut self, uuid: &str, username: &str) -> Result<Player>;
    /// Persist `username` and `past_usernames` of an existing player.
    fn update_player_names(&mut self, player: &Player) -> Result<()>;
    fn players(&self) -> Result<Vec<Player>>;

    // ── Events ──────────────────────────────────────────────────

    fn insert_session(&mut self, session: &NewPlaySession) -> Result<i64>;
    fn insert_player_death(&mut self, death: &NewPlayerDeath) -> Result<i64>;
    fn insert_villager_death(&mut self, death: &NewVillagerDeath) -> Result<i64>;
    fn insert_chat_message(&mut self, message: &NewChatMessage) -> Result<i64>;

    // ── Reporting ───────────────────────────────────────────────

    fn counts(&self) -> Result<RecordCounts>;
    fn player_stats(&self) -> Result<Vec<PlayerStats>>;
}
