//! Paper-Tide: a polite multi-source paper harvester
//!
//! This crate ingests advance-article listings from academic publishers,
//! normalizes them into one canonical paper shape, and merges them into a
//! local store without duplication or ordering drift.

pub mod config;
pub mod harvester;
pub mod normalize;
pub mod store;
pub mod sync;
pub mod topics;

use thiserror::Error;

/// Main error type for Paper-Tide operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] harvester::FetchError),

    #[error("Source ingestion failed: {0}")]
    Ingest(#[from] harvester::IngestError),

    #[error("Storage error: {0}")]
    Store(#[from] store::StoreError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Paper-Tide operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvester::{run_ingest, AccessMethod, RunSummary, SourceBatch, SourceOutcome};
pub use normalize::NormalizedPaper;
pub use sync::IdentityKey;
