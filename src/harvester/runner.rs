//! Run coordination across sources
//!
//! One cancellable task per source, joined at the end of the run. Sources
//! are independent: politeness delays live in each source's fetch session,
//! so concurrent sources never violate a single host's rate limit, and one
//! source failing never aborts the others.

use crate::config::Config;
use crate::harvester::chain::{ingest_source, AccessMethod, IngestError};
use crate::store::PaperStore;
use crate::sync;
use crate::topics::TopicTagger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Outcome of one source's ingestion
#[derive(Debug)]
pub enum SourceOutcome {
    /// Batch fully merged; a feed batch legitimately carries fewer fields,
    /// so callers must not infer success quality from record counts alone
    Ingested {
        method: AccessMethod,
        records: usize,
        inserted: usize,
        skipped: usize,
        parse_errors: usize,
        warnings: Vec<String>,
    },

    /// All access methods exhausted; stale data retained, sync state untouched
    Failed { error: String },
}

/// Per-source entry in the run summary
#[derive(Debug)]
pub struct SourceReport {
    pub source: String,
    pub outcome: SourceOutcome,
}

impl SourceReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Ingested { .. })
    }
}

/// Summary of one full ingestion run
#[derive(Debug)]
pub struct RunSummary {
    pub reports: Vec<SourceReport>,
}

impl RunSummary {
    /// Number of sources that ingested successfully
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.is_success()).count()
    }

    /// Number of sources that failed
    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }

    /// Total records inserted across all sources
    pub fn total_inserted(&self) -> usize {
        self.reports
            .iter()
            .filter_map(|r| match &r.outcome {
                SourceOutcome::Ingested { inserted, .. } => Some(*inserted),
                SourceOutcome::Failed { .. } => None,
            })
            .sum()
    }

    /// Process exit status: 0 all succeeded, 1 partial, 2 all failed
    pub fn exit_code(&self) -> i32 {
        if self.reports.is_empty() || self.failed() == 0 {
            0
        } else if self.succeeded() == 0 {
            2
        } else {
            1
        }
    }
}

/// Ingests all configured sources now
///
/// The single trigger operation: idempotent, safe to invoke repeatedly.
/// Each source runs as its own task under the concurrency bound and its own
/// wall-clock budget; a timed-out source is abandoned mid-fetch and treated
/// as failed for this run, leaving its sync state for the next clean retry.
pub async fn run_ingest(config: &Config, store: Arc<dyn PaperStore>) -> RunSummary {
    let tagger = Arc::new(TopicTagger::new(&config.topics));
    let semaphore = Arc::new(Semaphore::new(config.ingest.max_concurrent_sources as usize));
    let timeout = Duration::from_secs(config.ingest.source_timeout_secs);

    tracing::info!(
        "Starting ingestion run: {} sources, {} concurrent",
        config.sources.len(),
        config.ingest.max_concurrent_sources
    );

    let mut handles = Vec::with_capacity(config.sources.len());

    for source in config.sources.clone() {
        let semaphore = Arc::clone(&semaphore);
        let store = Arc::clone(&store);
        let tagger = Arc::clone(&tagger);
        let ingest = config.ingest.clone();

        handles.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return SourceReport {
                        source: source.id.clone(),
                        outcome: SourceOutcome::Failed {
                            error: "run cancelled".to_string(),
                        },
                    }
                }
            };

            let outcome =
                match tokio::time::timeout(timeout, ingest_source(&source, &ingest)).await {
                    Err(_) => {
                        let error = IngestError::Timeout {
                            source_id: source.id.clone(),
                            secs: timeout.as_secs(),
                        };
                        tracing::error!("{}", error);
                        SourceOutcome::Failed {
                            error: error.to_string(),
                        }
                    }
                    Ok(Err(error)) => {
                        tracing::error!("{}", error);
                        SourceOutcome::Failed {
                            error: error.to_string(),
                        }
                    }
                    Ok(Ok(mut batch)) => {
                        // Tag before merge so topics land in the store row
                        for paper in &mut batch.records {
                            paper.topics =
                                tagger.tag(&paper.title, paper.abstract_text.as_deref());
                        }

                        match sync::merge(store.as_ref(), &batch) {
                            Ok(outcome) => SourceOutcome::Ingested {
                                method: batch.method,
                                records: batch.records.len(),
                                inserted: outcome.inserted,
                                skipped: outcome.skipped,
                                parse_errors: batch.parse_errors,
                                warnings: batch.warnings,
                            },
                            Err(e) => SourceOutcome::Failed {
                                error: format!("merge failed: {}", e),
                            },
                        }
                    }
                };

            SourceReport {
                source: source.id,
                outcome,
            }
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::error!("Source task panicked: {}", e);
                reports.push(SourceReport {
                    source: "<unknown>".to_string(),
                    outcome: SourceOutcome::Failed {
                        error: format!("task panicked: {}", e),
                    },
                });
            }
        }
    }

    let summary = RunSummary { reports };
    tracing::info!(
        "Ingestion run finished: {} succeeded, {} failed, {} inserted",
        summary.succeeded(),
        summary.failed(),
        summary.total_inserted()
    );
    summary
}
