//! Schema — table definitions for the SQLite store.

use rusqlite::Connection;

pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             username TEXT NOT NULL,
             past_usernames TEXT NOT NULL DEFAULT '[]',
             minecraft_uuid TEXT NOT NULL
         );
         CREATE UNIQUE INDEX IF NOT EXISTS idx_users_uuid ON users(minecraft_uuid);

         CREATE TABLE IF NOT EXISTS sessions (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             start_time TEXT NOT NULL,
             end_time TEXT NOT NULL,
             user_id INTEGER NOT NULL REFERENCES users(id)
         );
         CREATE INDEX IF NOT EXISTS idx_sessions_start ON sessions(start_time);
         CREATE INDEX IF NOT EXISTS idx_sessions_end ON sessions(end_time);

         CREATE TABLE IF NOT EXISTS user_deaths (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             time TEXT NOT NULL,
             user_id INTEGER NOT NULL REFERENCES users(id),
             message TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_user_deaths_time ON user_deaths(time);

         CREATE TABLE IF NOT EXISTS villager_deaths (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             time TEXT NOT NULL,
             had_profession INTEGER NOT NULL,
             villager_data TEXT NOT NULL,
             village_name TEXT,
             message TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_villager_deaths_time ON villager_deaths(time);
         CREATE INDEX IF NOT EXISTS idx_villager_deaths_village ON villager_deaths(village_name);

         CREATE TABLE IF NOT EXISTS messages (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             time TEXT NOT NULL,
             user_id INTEGER NOT NULL REFERENCES users(id),
             message TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_messages_time ON messages(time);",
    )
}
