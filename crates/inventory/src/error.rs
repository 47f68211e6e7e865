//! Inventory error types.

use common::ProductId;
use ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur during inventory operations.
///
/// The first three variants are caller errors: they are reported with the
/// offending identifier and never retried, since retrying without new
/// input cannot succeed. `Ledger` wraps faults from the underlying store;
/// those abort the in-flight operation without partial state.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The quantity delta is zero or would overflow the stock level.
    #[error("Invalid quantity delta {quantity} for product {product_id}")]
    InvalidQuantity {
        product_id: ProductId,
        quantity: u32,
    },

    /// No stock record exists for the product.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The deduction would take the stock level below zero.
    #[error(
        "Insufficient quantity for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientQuantity {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// An error occurred in the ledger store.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
