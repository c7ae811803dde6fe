/// Server log line parsing
///
/// Turns one raw `[HH:MM:SS] [<source tag>]: <message>` line into a typed
/// [`LogEvent`]. Parsing is pure: cross-line state (who owns which name,
/// which sessions are open) lives in the ingestion driver.
///
/// # Architecture
///
/// - `model.rs`: parsed line and event types
/// - `line.rs`: line grammar and per-source sub-dispatch
/// - `death.rs`: death message catalog and classifier

pub mod model;
pub mod line;
pub mod death;

pub use model::{LogEvent, ParsedLine, TimeOfDay};
pub use line::LineParser;
pub use death::{CatalogError, DeathClassifier};

// Source tags
pub const SERVER_THREAD_TAG: &str = "Server thread/INFO";
pub const AUTHENTICATOR_TAG_PATTERN: &str = r"^User Authenticator #\d+/INFO$";
