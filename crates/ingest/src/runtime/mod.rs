//! Runtime module — process lifecycle: logging, boot, one ingestion run.

pub mod boot;
pub mod run;
