//! Fallback chain controller
//!
//! Attempts a source's access methods in order: the primary paginated
//! scrape in full, then the syndication feed when the primary retrieved
//! zero pages. A feed batch legitimately carries fewer records and fewer
//! fields, so the batch records which method produced it. Both methods
//! failing fails the source atomically; other sources are unaffected.

use crate::config::{IngestConfig, ItemOrder, SourceConfig};
use crate::harvester::feed::parse_feed;
use crate::harvester::session::{FetchError, FetchSession};
use crate::harvester::walker::walk_pages;
use crate::normalize::{assign_ordinals, normalize_record, NormalizedPaper};
use thiserror::Error;

/// Which access method produced a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMethod {
    /// Primary paginated listing scrape, full field set
    Primary,

    /// Syndication feed fallback, reduced field set
    Feed,
}

impl std::fmt::Display for AccessMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessMethod::Primary => write!(f, "primary"),
            AccessMethod::Feed => write!(f, "feed"),
        }
    }
}

/// One source's fully extracted and normalized batch for this run
#[derive(Debug)]
pub struct SourceBatch {
    pub source: String,
    pub records: Vec<NormalizedPaper>,
    pub method: AccessMethod,
    pub pages_fetched: u32,
    pub parse_errors: usize,
    pub warnings: Vec<String>,
}

/// Source-level ingestion failure; never aborts other sources
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("all access methods failed for source '{source_id}': primary: {primary}; secondary: {secondary}")]
    AllMethodsFailed {
        source_id: String,
        primary: FetchError,
        secondary: String,
    },

    #[error("source '{source_id}' exceeded its {secs}s time budget")]
    Timeout { source_id: String, secs: u64 },

    #[error("failed to build fetch session for source '{source_id}': {message}")]
    Session { source_id: String, message: String },
}

/// Ingests one source through its fallback chain
///
/// The primary method is attempted in full first. Only a primary walk that
/// retrieved zero pages (blocked or exhausted on page 0) escalates to the
/// feed; a partial primary walk stands on its own. An empty page 0 is a
/// normal zero-record success, not a trigger.
pub async fn ingest_source(
    source: &SourceConfig,
    ingest: &IngestConfig,
) -> Result<SourceBatch, IngestError> {
    let mut session = FetchSession::new(source, ingest).map_err(|e| IngestError::Session {
        source_id: source.id.clone(),
        message: e.to_string(),
    })?;

    let primary_error = match walk_pages(&mut session, source).await {
        Ok(set) => {
            let mut records: Vec<NormalizedPaper> = set
                .records
                .iter()
                .filter_map(|raw| normalize_record(raw, &source.id))
                .collect();
            assign_ordinals(&mut records, source.order);

            tracing::info!(
                "Source {}: primary method yielded {} records over {} pages",
                source.id,
                records.len(),
                set.pages_fetched
            );

            return Ok(SourceBatch {
                source: source.id.clone(),
                records,
                method: AccessMethod::Primary,
                pages_fetched: set.pages_fetched,
                parse_errors: set.parse_errors,
                warnings: set.warnings,
            });
        }
        Err(e) => e,
    };

    tracing::warn!(
        "Source {}: primary method failed ({}), escalating to feed",
        source.id,
        primary_error
    );

    let Some(feed_url) = &source.feed_url else {
        return Err(IngestError::AllMethodsFailed {
            source_id: source.id.clone(),
            primary: primary_error,
            secondary: "no feed configured".to_string(),
        });
    };

    let body = match session.fetch(feed_url).await {
        Ok(body) => body,
        Err(e) => {
            return Err(IngestError::AllMethodsFailed {
                source_id: source.id.clone(),
                primary: primary_error,
                secondary: e.to_string(),
            })
        }
    };

    let raw_records = match parse_feed(&body) {
        Ok(records) => records,
        Err(e) => {
            return Err(IngestError::AllMethodsFailed {
                source_id: source.id.clone(),
                primary: primary_error,
                secondary: format!("feed parse error: {}", e),
            })
        }
    };

    // Feeds present newest entries first; ordinals follow feed order
    let mut records: Vec<NormalizedPaper> = raw_records
        .iter()
        .filter_map(|raw| normalize_record(raw, &source.id))
        .collect();
    assign_ordinals(&mut records, ItemOrder::NewestFirst);

    tracing::info!(
        "Source {}: feed fallback yielded {} records",
        source.id,
        records.len()
    );

    Ok(SourceBatch {
        source: source.id.clone(),
        records,
        method: AccessMethod::Feed,
        pages_fetched: 0,
        parse_errors: 0,
        warnings: vec![format!(
            "primary method failed ({}); feed fallback carries reduced fields",
            primary_error
        )],
    })
}
