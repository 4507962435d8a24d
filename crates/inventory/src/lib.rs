//! Inventory domain module.
//!
//! Item records and the validation/stock rules the inventory ledger enforces,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;

pub use item::{Item, ItemDraft, ItemFilter};
