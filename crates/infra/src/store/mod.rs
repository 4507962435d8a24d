//! Transactional storage for items, orders, shipments, credentials, and the
//! audit trail.
//!
//! Workflows only see the [`Store`] / [`StoreTx`] ports. Two backends
//! implement them: an in-memory one for tests/dev and SQLite.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use r#trait::{Store, StoreError, StoreTx};
pub use sqlite::{SqliteOptions, SqliteStore};
