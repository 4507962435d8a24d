//! Sales domain module: customer orders and their fulfillment state machine.
//!
//! Pure domain logic only. Transactions, stock decrements, and persistence are
//! orchestrated by the infra layer.

pub mod order;

pub use order::{Order, OrderDraft, OrderLine, OrderStatus};
