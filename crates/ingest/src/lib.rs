// Module structure for the server log ingestion pipeline.

// Core infrastructure
pub mod conf;
pub mod store;
pub mod source;
pub mod parser;

// Domain modules
pub mod identity;
pub mod session;
pub mod village;
pub mod ingest;
pub mod runtime;
