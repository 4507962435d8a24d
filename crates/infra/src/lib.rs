//! Infrastructure layer: storage backends, workflows, audit trail, and the
//! gated call pipeline.

pub mod audit;
pub mod dispatcher;
pub mod requests;
pub mod store;
pub mod workflows;

mod integration_tests;

pub use audit::{AuditLogEntry, AuditRecorder, AuditSink, NewAuditEntry};
pub use dispatcher::{CallContext, Dispatcher, DispatcherSettings};
pub use store::{InMemoryStore, SqliteOptions, SqliteStore, Store, StoreError, StoreTx};
