//! Value objects for the order side: money, customer details, and the
//! transient order request. Requests are constructed per fulfillment
//! attempt and never persisted by the core.

use common::ProductId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FulfillmentError;

/// Unique identifier for one fulfillment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an order ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Money amount represented in cents to avoid floating point issues.
///
/// Negative amounts are representable so that a negative unit price can be
/// rejected with an explicit validation error instead of being silently
/// coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * i64::from(quantity),
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

/// Customer identity fields, opaque to the core and carried through to
/// the summary for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub address: String,
}

impl CustomerDetails {
    /// Creates new customer details.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// One line of an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// The product to deduct from.
    pub product_id: ProductId,

    /// Units requested.
    pub quantity: u32,

    /// Price per unit.
    pub unit_price: Money,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the total price for this line (quantity * unit_price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A multi-line order to fulfill, constructed per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: OrderId,
    pub customer: CustomerDetails,
    pub lines: Vec<OrderLine>,
}

impl OrderRequest {
    /// Creates a new order request with a fresh order ID.
    pub fn new(customer: CustomerDetails, lines: Vec<OrderLine>) -> Self {
        Self {
            order_id: OrderId::new(),
            customer,
            lines,
        }
    }

    /// Validates the request shape before any state is read.
    ///
    /// Rejects an empty line sequence, any zero quantity, and any negative
    /// unit price.
    pub fn validate(&self) -> Result<(), FulfillmentError> {
        if self.lines.is_empty() {
            return Err(FulfillmentError::InvalidRequest {
                reason: "order has no lines".to_string(),
            });
        }

        for line in &self.lines {
            if line.quantity == 0 {
                return Err(FulfillmentError::InvalidRequest {
                    reason: format!("line for product {} requests zero quantity", line.product_id),
                });
            }
            if line.unit_price.is_negative() {
                return Err(FulfillmentError::InvalidRequest {
                    reason: format!(
                        "line for product {} has negative unit price {}",
                        line.product_id, line.unit_price
                    ),
                });
            }
        }

        Ok(())
    }
}
