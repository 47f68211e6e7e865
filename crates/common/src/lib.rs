//! Shared identifier types for the stock ledger.

pub mod types;

pub use types::{BoxId, ProductId};
