use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use super::{LogSource, SourceError, SourceKind};

fn archive_name_re() -> &'static Regex {
    static ARCHIVE_NAME_RE: OnceLock<Regex> = OnceLock::new();
    ARCHIVE_NAME_RE.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(\d+)\.log\.gz$").expect("valid archive name regex")
    })
}

/// Date and rotation index encoded in an archive file name.
pub fn parse_archive_name(name: &str) -> Result<(NaiveDate, u32), SourceError> {
    let invalid = || SourceError::InvalidFileName(name.to_string());
    let caps = archive_name_re().captures(name).ok_or_else(invalid)?;

    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    let day: u32 = caps[3].parse().map_err(|_| invalid())?;
    let index: u32 = caps[4].parse().map_err(|_| invalid())?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    Ok((date, index))
}

/// List the sources under `dir`: archives by (date, index), then the current log.
///
/// `today` dates the current log. Entries that are neither are skipped.
pub fn discover(dir: &Path, current_log_name: &str, today: NaiveDate) -> Result<Vec<LogSource>, SourceError> {
    let mut archives = Vec::new();
    let mut current = None;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();

        if name == current_log_name {
            current = Some(LogSource {
                path,
                date: today,
                kind: SourceKind::Current,
                index: 0,
            });
            continue;
        }

        match parse_archive_name(&name) {
            Ok((date, index)) => archives.push(LogSource {
                path,
                date,
                kind: SourceKind::Archive,
                index,
            }),
            Err(_) => tracing::debug!(path = %path.display(), "Ignoring non-log file"),
        }
    }

    archives.sort_by(|a, b| (a.date, a.index).cmp(&(b.date, b.index)));
    archives.extend(current);
    Ok(archives)
}
