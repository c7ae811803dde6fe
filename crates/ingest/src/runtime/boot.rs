//! Boot — logging init, config load, store and parser construction.

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::IngestConfig;
use crate::ingest::Ingestor;
use crate::parser::{DeathClassifier, LineParser};
use crate::store::SqliteStore;
use crate::village::VillageIndex;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load and validate config, open the database, and build a fresh
/// [`Ingestor`] for one run.
pub fn boot() -> Result<(Ingestor<SqliteStore>, IngestConfig), Box<dyn std::error::Error>> {
    info!("Starting log ingestion v{}", env!("CARGO_PKG_VERSION"));

    let config = IngestConfig::load()?;
    config.validate()?;
    info!(
        "Loaded configuration: logs_dir={}, database={}, commit_mode={}",
        config.logs_dir,
        config.database_path,
        config.commit_mode.as_str()
    );

    let ingestor = build(&config)?;
    Ok((ingestor, config))
}

/// Everything [`boot`] does after the config is known.
pub fn build(config: &IngestConfig) -> Result<Ingestor<SqliteStore>, Box<dyn std::error::Error>> {
    let deaths = match &config.death_messages_path {
        Some(path) => {
            let catalog = DeathClassifier::from_file(path).map_err(|e| {
                error!("Failed to load death catalog: {}", e);
                e
            })?;
            info!("Loaded {} death patterns from {}", catalog.len(), path);
            catalog
        }
        None => DeathClassifier::builtin()?,
    };

    let store = SqliteStore::open(&config.database_path).map_err(|e| {
        error!("Failed to open database {}: {}", config.database_path, e);
        e
    })?;
    info!("Opened database at {}", config.database_path);

    let villages = VillageIndex::new(config.villages.clone(), config.village_radius);
    if !villages.is_empty() {
        info!("Tracking {} villages within {} blocks", config.villages.len(), config.village_radius);
    }

    Ok(Ingestor::new(store, LineParser::new(deaths), villages, config.commit_mode))
}
