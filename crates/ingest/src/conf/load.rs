//! Load — config loading from file and environment variables.

use std::path::Path;
use std::fs::File;
use std::io::Read;

use super::model::{CommitMode, IngestConfig};

impl IngestConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("INGEST_CONFIG_FILE")
            .unwrap_or_else(|_| "ingest.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using defaults", config_path);
            Self::default()
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: IngestConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Environment variables override file config
    fn apply_env(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Ok(dir) = std::env::var("INGEST_LOGS_DIR") {
            self.logs_dir = dir;
        }
        if let Ok(db) = std::env::var("INGEST_DATABASE") {
            self.database_path = db;
        }
        if let Ok(name) = std::env::var("INGEST_CURRENT_LOG") {
            self.current_log_name = name;
        }
        if let Ok(mode) = std::env::var("INGEST_COMMIT_MODE") {
            self.commit_mode = CommitMode::parse(&mode)
                .ok_or_else(|| format!("INGEST_COMMIT_MODE must be 'line' or 'file', got '{}'", mode))?;
        }
        if let Ok(max) = std::env::var("INGEST_MAX_FILES") {
            let max: usize = max
                .parse()
                .map_err(|_| format!("INGEST_MAX_FILES must be a number, got '{}'", max))?;
            self.max_files = Some(max);
        }
        if let Ok(path) = std::env::var("INGEST_DEATH_MESSAGES") {
            self.death_messages_path = Some(path);
        }
        Ok(())
    }
}
