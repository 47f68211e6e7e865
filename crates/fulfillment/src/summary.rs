//! The priced summary produced by a successful fulfillment.

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::order::{CustomerDetails, Money, OrderId};

/// One fulfilled line with its price and the state it left behind.
///
/// Item name and remaining quantity are snapshots taken at commit, so the
/// rendering collaborator needs no further reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSummary {
    pub product_id: ProductId,
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
    pub remaining_quantity: u32,
}

/// The priced document payload for a fully committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub customer: CustomerDetails,
    pub lines: Vec<LineSummary>,
    pub grand_total: Money,
    pub fulfilled_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serialization_roundtrip() {
        let summary = OrderSummary {
            order_id: OrderId::new(),
            customer: CustomerDetails::new("Ada", "1 Engine St"),
            lines: vec![LineSummary {
                product_id: ProductId::new("P1"),
                item_name: "Widget".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(1000),
                line_total: Money::from_cents(2000),
                remaining_quantity: 8,
            }],
            grand_total: Money::from_cents(2000),
            fulfilled_at: Utc::now(),
        };

        let json = serde_json::to_string(&summary).unwrap();
        let deserialized: OrderSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary, deserialized);
    }
}
