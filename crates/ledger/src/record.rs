use common::{BoxId, ProductId};
use serde::{Deserialize, Serialize};

/// Current stock state for one product.
///
/// The quantity is unsigned, so a negative stock level is unrepresentable;
/// write paths validate deltas with checked arithmetic before building a
/// new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Unique product identifier (primary key).
    pub product_id: ProductId,

    /// Human-readable item label.
    pub item_name: String,

    /// Units currently on hand.
    pub quantity: u32,

    /// Physical storage location, last-write-wins on receipt.
    pub box_id: BoxId,
}

impl StockRecord {
    /// Creates a new stock record.
    pub fn new(
        product_id: impl Into<ProductId>,
        item_name: impl Into<String>,
        quantity: u32,
        box_id: impl Into<BoxId>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            item_name: item_name.into(),
            quantity,
            box_id: box_id.into(),
        }
    }
}
