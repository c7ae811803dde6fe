use std::fs;
use std::io::Read;

use flate2::read::GzDecoder;

use super::{LogSource, SourceError, SourceKind};

/// Full decoded text of a source.
///
/// Invalid UTF-8 is replaced rather than rejected; a truncated or corrupt
/// archive is an error.
pub fn read_source(source: &LogSource) -> Result<String, SourceError> {
    let raw = fs::read(&source.path)?;

    let bytes = match source.kind {
        SourceKind::Current => raw,
        SourceKind::Archive => gunzip(&raw)?,
    };

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(path = %source.path.display(), "Replacing invalid UTF-8");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    })
}

fn gunzip(raw: &[u8]) -> Result<Vec<u8>, SourceError> {
    let mut decoder = GzDecoder::new(raw);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| SourceError::Decompress(e.to_string()))?;
    Ok(out)
}
