use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockflow_core::{ItemId, Money, OrderId, Page, PageRequest};
use stockflow_inventory::{Item, ItemFilter};
use stockflow_sales::{Order, OrderStatus};
use stockflow_shipping::{Shipment, ShipmentFilter, ShipmentUpdate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored row is corrupt: {0}")]
    Corrupt(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),
}

/// Transactional persistence for items, orders, and shipments.
///
/// ## Transactions
///
/// Every mutation goes through a [`StoreTx`] obtained from [`Store::begin`].
/// Writes staged on a transaction become visible to other callers only on
/// [`StoreTx::commit`]. Dropping a transaction without committing discards
/// everything it staged, which is how deadline expiry and early error returns
/// roll back.
///
/// Implementations serialize write transactions against each other, so a
/// read-check-write sequence inside one transaction cannot interleave with
/// another writer.
///
/// ## Reads
///
/// The non-transactional reads observe committed state only. `order` returns
/// an order and its lines from one consistent snapshot.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    async fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Items matching `filter`, ordered by name then id.
    async fn list_items(&self, filter: &ItemFilter, page: PageRequest)
    -> Result<Page<Item>, StoreError>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Shipments matching `filter`, in creation order.
    async fn list_shipments(
        &self,
        filter: &ShipmentFilter,
        page: PageRequest,
    ) -> Result<Page<Shipment>, StoreError>;
}

#[async_trait]
impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        (**self).begin().await
    }

    async fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).item(id).await
    }

    async fn list_items(
        &self,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> Result<Page<Item>, StoreError> {
        (**self).list_items(filter, page).await
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).order(id).await
    }

    async fn list_shipments(
        &self,
        filter: &ShipmentFilter,
        page: PageRequest,
    ) -> Result<Page<Shipment>, StoreError> {
        (**self).list_shipments(filter, page).await
    }
}

/// An open write transaction.
///
/// Mutations that target a single row report whether the row existed
/// (`bool` / `Option`) instead of failing, so callers decide which error
/// the caller sees.
#[async_trait]
pub trait StoreTx: Send {
    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError>;

    /// Overwrite the mutable fields of an existing item. `false` if absent.
    async fn update_item(&mut self, item: &Item) -> Result<bool, StoreError>;

    async fn delete_item(&mut self, id: ItemId) -> Result<bool, StoreError>;

    async fn item_price(&mut self, id: ItemId) -> Result<Option<Money>, StoreError>;

    /// Subtract `quantity` from the item's stock only if at least that much is
    /// on hand. `false` if the item is absent or short.
    async fn decrement_stock(&mut self, id: ItemId, quantity: i64) -> Result<bool, StoreError>;

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Move an order from `from` to `to`. `false` if the order is absent or
    /// not currently in `from`.
    async fn transition_order(
        &mut self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError>;

    async fn insert_shipment(&mut self, shipment: &Shipment) -> Result<(), StoreError>;

    /// Apply `update` and return the resulting shipment, or `None` if absent.
    async fn update_shipment(
        &mut self,
        update: &ShipmentUpdate,
    ) -> Result<Option<Shipment>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
