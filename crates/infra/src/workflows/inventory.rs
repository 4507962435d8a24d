use std::sync::Arc;

use chrono::Utc;

use stockflow_core::{ItemId, Page, PageRequest, ServiceError, ServiceResult};
use stockflow_inventory::{Item, ItemDraft, ItemFilter};

use super::{Staged, storage};
use crate::requests::{
    CreateItemRequest, DeleteItemRequest, DeleteItemResponse, ListItemsRequest, UpdateItemRequest,
};
use crate::store::Store;

/// Owns item records: stock on hand and current unit price.
#[derive(Clone)]
pub struct InventoryLedger {
    store: Arc<dyn Store>,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_item(&self, req: CreateItemRequest) -> ServiceResult<Staged<Item>> {
        let item = ItemDraft::new(req.name, req.description, req.quantity, req.unit_price)?
            .into_item(ItemId::new(), Utc::now());

        let mut tx = self.store.begin().await.map_err(storage("failed to create item"))?;
        tx.insert_item(&item)
            .await
            .map_err(storage("failed to create item"))?;

        tracing::debug!(item_id = %item.id, quantity = item.quantity, "item insert staged");
        Ok(Staged::new(tx, item, "failed to create item"))
    }

    /// Overwrite every mutable field and bump `updated_at`.
    pub async fn update_item(&self, req: UpdateItemRequest) -> ServiceResult<Staged<Item>> {
        let id = ItemId::parse_required(&req.id)?;
        let item = ItemDraft::new(req.name, req.description, req.quantity, req.unit_price)?
            .into_item(id, Utc::now());

        let mut tx = self.store.begin().await.map_err(storage("failed to update item"))?;
        if !tx
            .update_item(&item)
            .await
            .map_err(storage("failed to update item"))?
        {
            return Err(ServiceError::not_found("item not found"));
        }

        tracing::debug!(item_id = %item.id, quantity = item.quantity, "item update staged");
        Ok(Staged::new(tx, item, "failed to update item"))
    }

    pub async fn delete_item(
        &self,
        req: DeleteItemRequest,
    ) -> ServiceResult<Staged<DeleteItemResponse>> {
        let id = ItemId::parse_required(&req.id)?;

        let mut tx = self.store.begin().await.map_err(storage("failed to delete item"))?;
        if !tx
            .delete_item(id)
            .await
            .map_err(storage("failed to delete item"))?
        {
            return Err(ServiceError::not_found("item not found"));
        }

        tracing::debug!(item_id = %id, "item delete staged");
        Ok(Staged::new(
            tx,
            DeleteItemResponse { success: true },
            "failed to delete item",
        ))
    }

    pub async fn list_items(&self, req: ListItemsRequest) -> ServiceResult<Page<Item>> {
        let page = PageRequest::new(req.page, req.page_size)?;
        self.store
            .list_items(&ItemFilter::new(req.name_filter), page)
            .await
            .map_err(storage("failed to list items"))
    }
}
