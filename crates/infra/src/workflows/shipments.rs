use std::sync::Arc;

use chrono::Utc;

use stockflow_core::{Page, PageRequest, ServiceError, ServiceResult, ShipmentId};
use stockflow_shipping::{Shipment, ShipmentDraft, ShipmentFilter, ShipmentUpdate};

use super::{Staged, storage};
use crate::requests::{CreateShipmentRequest, ListShipmentsRequest, UpdateShipmentRequest};
use crate::store::Store;

/// Shipment records for fulfilled orders.
#[derive(Clone)]
pub struct ShipmentTracker {
    store: Arc<dyn Store>,
}

impl ShipmentTracker {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Only a `FULFILLED` order ships. The new shipment starts `PENDING`.
    pub async fn create_shipment(
        &self,
        req: CreateShipmentRequest,
    ) -> ServiceResult<Staged<Shipment>> {
        let draft = ShipmentDraft::new(&req.order_id, req.tracking_number)?;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(storage("failed to create shipment"))?;

        let order = tx
            .order(draft.order_id())
            .await
            .map_err(storage("failed to create shipment"))?
            .ok_or_else(|| ServiceError::not_found("order not found"))?;
        order.status.ensure_shippable()?;

        let shipment = draft.into_shipment(ShipmentId::new(), Utc::now());
        tx.insert_shipment(&shipment)
            .await
            .map_err(storage("failed to create shipment"))?;

        tracing::debug!(shipment_id = %shipment.id, order_id = %shipment.order_id, "shipment insert staged");
        Ok(Staged::new(tx, shipment, "failed to create shipment"))
    }

    pub async fn update_shipment(
        &self,
        req: UpdateShipmentRequest,
    ) -> ServiceResult<Staged<Shipment>> {
        let update = ShipmentUpdate::new(&req.id, req.status, req.tracking_number, Utc::now())?;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(storage("failed to update shipment"))?;
        let shipment = tx
            .update_shipment(&update)
            .await
            .map_err(storage("failed to update shipment"))?
            .ok_or_else(|| ServiceError::not_found("shipment not found"))?;

        tracing::debug!(shipment_id = %shipment.id, status = %shipment.status, "shipment update staged");
        Ok(Staged::new(tx, shipment, "failed to update shipment"))
    }

    pub async fn list_shipments(&self, req: ListShipmentsRequest) -> ServiceResult<Page<Shipment>> {
        let page = PageRequest::new(req.page, req.page_size)?;
        let filter = ShipmentFilter::parse(&req.order_id)?;
        self.store
            .list_shipments(&filter, page)
            .await
            .map_err(storage("failed to list shipments"))
    }
}
