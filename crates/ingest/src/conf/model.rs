//! Model — IngestConfig and related structs.

use std::collections::HashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory holding `YYYY-MM-DD-N.log.gz` archives and the current log
    pub logs_dir: String,
    /// SQLite database file, or `:memory:`
    pub database_path: String,
    /// File name of the uncompressed, still-growing log
    pub current_log_name: String,
    pub commit_mode: CommitMode,
    /// Only ingest the earliest N sources
    pub max_files: Option<usize>,
    /// TOML file replacing the built-in death message catalog
    pub death_messages_path: Option<String>,
    pub villages: Vec<VillageConfig>,
    pub village_radius: f64,
}

/// How many log lines share one storage transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// One transaction per line: a crash loses at most the in-flight line.
    #[default]
    Line,
    /// One transaction per file: a crash loses the in-flight file.
    File,
}

impl CommitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitMode::Line => "line",
            CommitMode::File => "file",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "line" => Some(CommitMode::Line),
            "file" => Some(CommitMode::File),
            _ => None,
        }
    }
}

/// A named village centre in block coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillageConfig {
    pub name: String,
    pub x: f64,
    pub z: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            logs_dir: "./logs".to_string(),
            database_path: "ingest.db".to_string(),
            current_log_name: "latest.log".to_string(),
            commit_mode: CommitMode::Line,
            max_files: None,
            death_messages_path: None,
            villages: Vec::new(),
            village_radius: 1000.0,
        }
    }
}

impl IngestConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.logs_dir.trim().is_empty() {
            return Err("logs_dir must not be empty".to_string());
        }
        if self.database_path.trim().is_empty() {
            return Err("database_path must not be empty".to_string());
        }
        if self.current_log_name.trim().is_empty() {
            return Err("current_log_name must not be empty".to_string());
        }
        if self.max_files == Some(0) {
            return Err("max_files must be > 0 when set".to_string());
        }
        if !self.village_radius.is_finite() || self.village_radius <= 0.0 {
            return Err("village_radius must be a positive number".to_string());
        }

        let mut seen = HashSet::new();
        for village in &self.villages {
            if !seen.insert(village.name.as_str()) {
                return Err(format!("duplicate village name: {}", village.name));
            }
        }
        Ok(())
    }
}
