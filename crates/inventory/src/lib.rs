//! Inventory store: the sole mutator of stock state.
//!
//! Every successful mutation commits the quantity change and exactly one
//! audit entry as a single unit of work, and the non-negative stock
//! invariant is validated before any state is touched. Mutations on one
//! product serialize through the ledger's conditional update; different
//! products proceed in parallel.

pub mod commands;
pub mod error;
pub mod service;

pub use commands::{DeductStock, ReceiveStock};
pub use error::InventoryError;
pub use service::InventoryStore;
