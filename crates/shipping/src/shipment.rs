use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{OrderId, ServiceError, ShipmentId};

/// Status every shipment starts in. Later statuses are free-form.
pub const INITIAL_STATUS: &str = "PENDING";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub status: String,
    pub tracking_number: String,
    pub updated_at: DateTime<Utc>,
}

/// Validated request to ship an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentDraft {
    order_id: OrderId,
    tracking_number: String,
}

impl ShipmentDraft {
    pub fn new(order_id: &str, tracking_number: impl Into<String>) -> Result<Self, ServiceError> {
        let tracking_number = tracking_number.into();
        if order_id.is_empty() || tracking_number.is_empty() {
            return Err(ServiceError::invalid_argument(
                "order id and tracking number required",
            ));
        }
        Ok(Self {
            order_id: OrderId::parse_required(order_id)?,
            tracking_number,
        })
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn into_shipment(self, id: ShipmentId, now: DateTime<Utc>) -> Shipment {
        Shipment {
            id,
            order_id: self.order_id,
            status: INITIAL_STATUS.to_string(),
            tracking_number: self.tracking_number,
            updated_at: now,
        }
    }
}

/// Validated overwrite of a shipment's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentUpdate {
    pub id: ShipmentId,
    pub status: String,
    pub tracking_number: String,
    pub updated_at: DateTime<Utc>,
}

impl ShipmentUpdate {
    pub fn new(
        id: &str,
        status: impl Into<String>,
        tracking_number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ServiceError> {
        let status = status.into();
        if id.is_empty() || status.is_empty() {
            return Err(ServiceError::invalid_argument("shipment id and status required"));
        }
        Ok(Self {
            id: ShipmentId::parse_required(id)?,
            status,
            tracking_number: tracking_number.into(),
            updated_at: now,
        })
    }

    /// Apply to the stored shipment. The order reference never changes.
    pub fn apply_to(&self, shipment: &mut Shipment) {
        shipment.status = self.status.clone();
        shipment.tracking_number = self.tracking_number.clone();
        shipment.updated_at = self.updated_at;
    }
}

/// Listing filter: optionally restrict to one order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentFilter {
    pub order_id: Option<OrderId>,
}

impl ShipmentFilter {
    /// Empty input means "all orders".
    pub fn parse(order_id: &str) -> Result<Self, ServiceError> {
        if order_id.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self {
            order_id: Some(OrderId::parse_required(order_id)?),
        })
    }

    pub fn matches(&self, shipment: &Shipment) -> bool {
        self.order_id.is_none_or(|id| shipment.order_id == id)
    }
}
