//! `stockflow-core`: shared building blocks for the supply-chain back office.
//!
//! This crate contains **pure** primitives (no IO): identifiers, money, the
//! service error taxonomy, and pagination.

pub mod error;
pub mod id;
pub mod money;
pub mod page;

pub use error::{Code, ServiceError, ServiceResult};
pub use id::{ItemId, OrderId, ShipmentId};
pub use money::Money;
pub use page::{Page, PageRequest};
