//! In-memory store implementation
//!
//! Backs unit and integration tests; behaves like the SQLite store for the
//! operations the pipeline cares about, including counting an already
//! present key as a non-insert.

use crate::normalize::NormalizedPaper;
use crate::store::traits::{PaperStore, StoreResult};
use crate::sync::{IdentityKey, SyncState};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    papers: HashMap<IdentityKey, NormalizedPaper>,
    sync_states: HashMap<String, SyncState>,
}

/// HashMap-backed paper store
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored papers for one source, for assertions in tests
    pub fn papers_for(&self, source: &str) -> Vec<NormalizedPaper> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut papers: Vec<_> = inner
            .papers
            .values()
            .filter(|p| p.source == source)
            .cloned()
            .collect();
        papers.sort_by_key(|p| p.ordinal);
        papers
    }
}

impl PaperStore for MemoryStore {
    fn existing_keys(&self, source: &str) -> StoreResult<HashSet<IdentityKey>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .papers
            .iter()
            .filter(|(_, p)| p.source == source)
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn insert_papers(&self, papers: &[(IdentityKey, NormalizedPaper)]) -> StoreResult<usize> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let mut inserted = 0;

        for (key, paper) in papers {
            if !inner.papers.contains_key(key) {
                inner.papers.insert(key.clone(), paper.clone());
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    fn sync_state(&self, source: &str) -> StoreResult<Option<SyncState>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.sync_states.get(source).cloned())
    }

    fn update_sync_state(&self, source: &str, state: &SyncState) -> StoreResult<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.sync_states.insert(source.to_string(), state.clone());
        Ok(())
    }

    fn count_papers(&self, source: &str) -> StoreResult<u64> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.papers.values().filter(|p| p.source == source).count() as u64)
    }

    fn count_all(&self) -> StoreResult<u64> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.papers.len() as u64)
    }
}
