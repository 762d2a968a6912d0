//! CLI command implementations

pub mod analytics;
pub mod config;
pub mod documents;
pub mod ingest;
