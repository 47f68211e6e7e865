//! Commands accepted by the inventory store.

use common::{BoxId, ProductId};
use serde::{Deserialize, Serialize};

/// Command to receive stock into inventory.
///
/// Creates the record on first receipt for an unseen product; on later
/// receipts the box location is overwritten last-write-wins and the
/// supplied item name is snapshotted into the audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub product_id: ProductId,
    pub item_name: String,
    pub quantity: u32,
    pub box_id: BoxId,
}

impl ReceiveStock {
    /// Creates a new receive-stock command.
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

/// Command to deduct stock for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductStock {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl DeductStock {
    /// Creates a new deduct-stock command.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}
