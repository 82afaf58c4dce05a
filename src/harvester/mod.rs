//! Harvester module for source fetching and extraction
//!
//! This module contains the core ingestion logic, including:
//! - HTTP fetching with politeness delays and retry/backoff
//! - Pagination traversal with empty-page and duplicate-page termination
//! - Strategy-table HTML extraction
//! - Feed-based fallback access
//! - Concurrent per-source run coordination

mod chain;
mod extractor;
mod feed;
mod runner;
mod session;
mod walker;

pub use chain::{ingest_source, AccessMethod, IngestError, SourceBatch};
pub use extractor::{extract_records, ExtractionOutcome, RawRecord};
pub use feed::parse_feed;
pub use runner::{run_ingest, RunSummary, SourceOutcome, SourceReport};
pub use session::{FetchError, FetchSession};
pub use walker::{walk_pages, PageSet};
