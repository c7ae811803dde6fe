//! Run — discover sources, ingest them once, log the outcome.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::conf::IngestConfig;
use crate::ingest::{IngestReport, Ingestor};
use crate::source::discover;
use crate::store::Store;

/// Ingest every source under `config.logs_dir`, dating the current log today (UTC).
pub fn run<S: Store>(
    ingestor: Ingestor<S>,
    config: &IngestConfig,
) -> Result<IngestReport, Box<dyn std::error::Error>> {
    run_on(ingestor, config, Utc::now().date_naive())
}

pub fn run_on<S: Store>(
    mut ingestor: Ingestor<S>,
    config: &IngestConfig,
    today: NaiveDate,
) -> Result<IngestReport, Box<dyn std::error::Error>> {
    let mut sources = discover(Path::new(&config.logs_dir), &config.current_log_name, today)?;
    info!("Discovered {} log files in {}", sources.len(), config.logs_dir);

    if let Some(max) = config.max_files {
        if sources.len() > max {
            info!("Limiting run to the first {} of {} log files", max, sources.len());
            sources.truncate(max);
        }
    }

    let report = ingestor.run(&sources)?;
    info!(
        files = report.files_ingested,
        skipped = report.files_skipped,
        lines = report.lines_read,
        unparsed = report.lines_unparsed,
        records = report.records_written,
        dropped = report.dropped.total(),
        "Ingestion finished"
    );
    if let Ok(json) = serde_json::to_string(&report) {
        info!("Run report: {}", json);
    }

    log_player_summary(ingestor.store())?;
    Ok(report)
}

fn log_player_summary<S: Store>(store: &S) -> Result<(), Box<dyn std::error::Error>> {
    for stats in store.player_stats()? {
        info!(
            player = %stats.player.username,
            uuid = %stats.player.uuid,
            past_names = ?stats.player.past_usernames,
            deaths = stats.deaths,
            sessions = stats.sessions,
            playtime_mins = stats.playtime_secs / 60,
            chat = stats.chat_messages,
            "Player summary"
        );
    }
    Ok(())
}
