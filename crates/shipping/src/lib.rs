//! Shipping domain module: shipments raised against fulfilled orders.

pub mod shipment;

pub use shipment::{Shipment, ShipmentDraft, ShipmentFilter, ShipmentUpdate, INITIAL_STATUS};
