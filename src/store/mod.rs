//! Paper store backends
//!
//! The sync engine talks to persistence through the `PaperStore` trait:
//! read a source's existing identity keys, submit a batch, record sync
//! state. The SQLite backend is the production store; the in-memory backend
//! backs the test suite.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{PaperStore, StoreError, StoreResult};
