use std::sync::Arc;

use chrono::Utc;

use stockflow_core::{ItemId, OrderId, ServiceError, ServiceResult};
use stockflow_sales::{Order, OrderDraft, OrderLine, OrderStatus};

use super::{Staged, storage};
use crate::requests::{CreateOrderRequest, FulfillOrderRequest, GetOrderRequest};
use crate::store::Store;

/// Order creation (price snapshot), fulfillment, and reads.
#[derive(Clone)]
pub struct OrderWorkflow {
    store: Arc<dyn Store>,
}

impl OrderWorkflow {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Price every line at today's unit price and stage the order as
    /// `PENDING`, all in one transaction. Stock is not checked here.
    pub async fn create_order(&self, req: CreateOrderRequest) -> ServiceResult<Staged<Order>> {
        let lines = req
            .lines
            .iter()
            .map(|line| {
                Ok(OrderLine {
                    item_id: ItemId::parse_required(&line.item_id)?,
                    quantity: line.quantity,
                })
            })
            .collect::<ServiceResult<Vec<_>>>()?;
        let draft = OrderDraft::new(req.customer_id, lines)?;

        let mut tx = self.store.begin().await.map_err(storage("failed to create order"))?;

        let mut prices = Vec::with_capacity(draft.lines().len());
        for line in draft.lines() {
            let price = tx
                .item_price(line.item_id)
                .await
                .map_err(storage("failed to create order"))?
                .ok_or_else(|| ServiceError::not_found(format!("item {} not found", line.item_id)))?;
            prices.push(price);
        }

        let total = draft.total(&prices)?;
        let order = draft.into_order(OrderId::new(), total, Utc::now());

        tx.insert_order(&order)
            .await
            .map_err(storage("failed to create order"))?;

        tracing::debug!(
            order_id = %order.id,
            lines = order.lines.len(),
            total = %order.total,
            "order insert staged"
        );
        Ok(Staged::new(tx, order, "failed to create order"))
    }

    /// `PENDING → FULFILLED` plus one conditional stock decrement per line,
    /// all or nothing.
    ///
    /// The transition is a compare-and-set on `status = PENDING` and runs
    /// first, so of two racing fulfillments exactly one gets past it. Any
    /// short line aborts the transaction, undoing the transition and every
    /// decrement already applied.
    pub async fn fulfill_order(&self, req: FulfillOrderRequest) -> ServiceResult<Staged<Order>> {
        let id = OrderId::parse_required(&req.order_id)?;

        let mut tx = self.store.begin().await.map_err(storage("failed to fulfill order"))?;

        let transitioned = tx
            .transition_order(id, OrderStatus::Pending, OrderStatus::Fulfilled)
            .await
            .map_err(storage("failed to fulfill order"))?;
        if !transitioned {
            return match tx.order(id).await.map_err(storage("failed to fulfill order"))? {
                None => Err(ServiceError::not_found("order not found")),
                Some(_) => Err(ServiceError::failed_precondition("order cannot be fulfilled")),
            };
        }

        let order = tx
            .order(id)
            .await
            .map_err(storage("failed to fulfill order"))?
            .ok_or_else(|| ServiceError::internal("failed to fulfill order"))?;

        for line in &order.lines {
            let applied = tx
                .decrement_stock(line.item_id, line.quantity)
                .await
                .map_err(storage("failed to fulfill order"))?;
            if !applied {
                tracing::info!(
                    order_id = %id,
                    item_id = %line.item_id,
                    requested = line.quantity,
                    "insufficient stock, fulfillment rolled back"
                );
                return Err(ServiceError::failed_precondition(format!(
                    "insufficient stock for item {}",
                    line.item_id
                )));
            }
        }

        tracing::debug!(order_id = %id, lines = order.lines.len(), "fulfillment staged");
        Ok(Staged::new(tx, order, "failed to fulfill order"))
    }

    /// Order plus lines from one consistent read.
    pub async fn get_order(&self, req: GetOrderRequest) -> ServiceResult<Order> {
        let id = OrderId::parse_required(&req.id)?;
        self.store
            .order(id)
            .await
            .map_err(storage("failed to get order"))?
            .ok_or_else(|| ServiceError::not_found("order not found"))
    }
}
