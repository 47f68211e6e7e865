//! Fulfillment error types.

use common::ProductId;
use inventory::InventoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::OrderId;

/// Errors that can occur while executing an order.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The request failed shape validation before any state was read.
    #[error("Invalid order request: {reason}")]
    InvalidRequest { reason: String },

    /// A line references a product with no stock record.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The all-or-nothing feasibility check failed; no deductions were
    /// applied to any line.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Some lines committed before a later line failed. The payload
    /// identifies exactly which lines committed, with what resulting
    /// quantities, so the caller can reconcile or compensate.
    #[error("{0}")]
    Partial(Box<PartialFulfillment>),

    /// An error occurred in the inventory store.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

/// A line that committed before the order failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Stock remaining on the product immediately after this deduction.
    pub remaining_quantity: u32,
}

/// The line whose deduction failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub reason: String,
}

/// Reconciliation detail for an order that stopped partway: the committed
/// deductions are individually durable and are never rolled back
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFulfillment {
    pub order_id: OrderId,
    pub committed: Vec<CommittedLine>,
    pub failed: FailedLine,
    /// Products of the lines that were never attempted, in request order.
    pub unattempted: Vec<ProductId>,
}

impl std::fmt::Display for PartialFulfillment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order {} partially fulfilled: {} line(s) committed, line for product {} failed ({}), {} line(s) not attempted",
            self.order_id,
            self.committed.len(),
            self.failed.product_id,
            self.failed.reason,
            self.unattempted.len()
        )
    }
}

/// Result type for fulfillment operations.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
