//! Ingest — drives parsed lines into identities, sessions and storage.

pub mod driver;
pub mod error;
pub mod stats;

pub use driver::Ingestor;
pub use error::IngestError;
pub use stats::{DropCounts, IngestReport};
