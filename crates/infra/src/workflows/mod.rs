//! Workflow components behind the gate.
//!
//! Each workflow holds the shared [`Store`](crate::store::Store) port and
//! turns raw requests into validated domain values before touching it.
//! Validation therefore always fails before a transaction is opened.
//!
//! Mutations return a [`Staged`] result: every write is applied to an open
//! transaction and the caller decides when to commit it.

pub mod inventory;
pub mod orders;
pub mod shipments;

pub use inventory::InventoryLedger;
pub use orders::OrderWorkflow;
pub use shipments::ShipmentTracker;

use stockflow_core::{ServiceError, ServiceResult};

use crate::store::{StoreError, StoreTx};

/// A workflow result whose writes are staged on an uncommitted transaction.
///
/// Dropping it rolls the writes back. A read has nothing to commit.
#[must_use = "staged writes are rolled back unless committed"]
pub struct Staged<T> {
    tx: Option<Box<dyn StoreTx>>,
    value: T,
    context: &'static str,
}

impl<T> Staged<T> {
    pub(crate) fn new(tx: Box<dyn StoreTx>, value: T, context: &'static str) -> Self {
        Self {
            tx: Some(tx),
            value,
            context,
        }
    }

    pub(crate) fn ready(value: T) -> Self {
        Self {
            tx: None,
            value,
            context: "",
        }
    }

    pub async fn commit(self) -> ServiceResult<T> {
        if let Some(tx) = self.tx {
            tx.commit().await.map_err(storage(self.context))?;
        }
        Ok(self.value)
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Staged<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Staged")
            .field("value", &self.value)
            .field("context", &self.context)
            .field("pending", &self.tx.is_some())
            .finish_non_exhaustive()
    }
}

/// Log a store failure with its cause and hide it behind `Internal(context)`.
pub(crate) fn storage(context: &'static str) -> impl FnOnce(StoreError) -> ServiceError {
    move |err| {
        tracing::error!(error = %err, "{}", context);
        ServiceError::internal(context)
    }
}
