use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{ItemId, Money, OrderId, ServiceError};

/// Order status lifecycle: `Pending --fulfill--> Fulfilled` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Fulfilled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Fulfilled => "FULFILLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "FULFILLED" => Some(OrderStatus::Fulfilled),
            _ => None,
        }
    }

    /// Guard for shipping: only fulfilled orders ship.
    pub fn ensure_shippable(self) -> Result<(), ServiceError> {
        match self {
            OrderStatus::Fulfilled => Ok(()),
            OrderStatus::Pending => Err(ServiceError::failed_precondition(
                "order must be fulfilled",
            )),
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line: item and requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub quantity: i64,
}

/// A customer order with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: String,
    pub lines: Vec<OrderLine>,
    /// Computed once at creation from the unit prices of that moment.
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Validated order request, not yet priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    customer_id: String,
    lines: Vec<OrderLine>,
}

impl OrderDraft {
    pub fn new(customer_id: impl Into<String>, lines: Vec<OrderLine>) -> Result<Self, ServiceError> {
        let customer_id = customer_id.into();
        if customer_id.is_empty() {
            return Err(ServiceError::invalid_argument("customer id required"));
        }
        if lines.is_empty() {
            return Err(ServiceError::invalid_argument("order needs at least one line"));
        }

        let mut seen = HashSet::with_capacity(lines.len());
        for line in &lines {
            if line.quantity < 1 {
                return Err(ServiceError::invalid_argument(format!(
                    "line quantity must be positive (item {})",
                    line.item_id
                )));
            }
            // order_items is keyed by (order, item)
            if !seen.insert(line.item_id) {
                return Err(ServiceError::invalid_argument(format!(
                    "item {} appears on more than one line",
                    line.item_id
                )));
            }
        }

        Ok(Self { customer_id, lines })
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Price snapshot: `Σ unit_price × quantity` over the given per-line prices.
    ///
    /// `unit_prices` must be in line order. All prices must share one currency.
    pub fn total(&self, unit_prices: &[Money]) -> Result<Money, ServiceError> {
        if unit_prices.len() != self.lines.len() {
            return Err(ServiceError::internal("price lookup out of step with order lines"));
        }

        let mut iter = self.lines.iter().zip(unit_prices);
        let (first_line, first_price) = iter
            .next()
            .ok_or_else(|| ServiceError::invalid_argument("order needs at least one line"))?;
        let mut total = first_price.checked_mul(first_line.quantity)?;
        for (line, price) in iter {
            total = total.checked_add(&price.checked_mul(line.quantity)?)?;
        }
        Ok(total)
    }

    /// Materialize a pending order under `id`.
    pub fn into_order(self, id: OrderId, total: Money, now: DateTime<Utc>) -> Order {
        Order {
            id,
            customer_id: self.customer_id,
            lines: self.lines,
            total,
            status: OrderStatus::Pending,
            created_at: now,
        }
    }
}
