//! Store trait and error types
//!
//! The pipeline only needs two things from persistence: a way to read the
//! identity keys already ingested for a source, and a way to submit a batch
//! of new records. Everything else here exists for reporting.

use crate::normalize::NormalizedPaper;
use crate::sync::{IdentityKey, SyncState};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for paper store backends
///
/// Implementations must be shareable across source tasks; the merge is the
/// only shared-resource access and happens once per source after all of that
/// source's fetching completes.
pub trait PaperStore: Send + Sync {
    /// Identity keys already ingested for a source
    fn existing_keys(&self, source: &str) -> StoreResult<HashSet<IdentityKey>>;

    /// Inserts a batch of keyed papers
    ///
    /// Returns the number actually inserted. A key collision (another run
    /// racing ahead, or a backend UNIQUE constraint) must be counted as a
    /// non-insert, not raised as an error, so the merge stays idempotent
    /// wherever the membership check executes.
    fn insert_papers(&self, papers: &[(IdentityKey, NormalizedPaper)]) -> StoreResult<usize>;

    /// Last recorded sync state for a source
    fn sync_state(&self, source: &str) -> StoreResult<Option<SyncState>>;

    /// Records a source's sync state after a successful merge
    fn update_sync_state(&self, source: &str, state: &SyncState) -> StoreResult<()>;

    /// Number of stored papers for one source
    fn count_papers(&self, source: &str) -> StoreResult<u64>;

    /// Total number of stored papers
    fn count_all(&self) -> StoreResult<u64>;
}
