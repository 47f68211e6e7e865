use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};

/// Position of an audit entry in the log.
///
/// Assigned by the store at insert time, monotonically increasing across
/// the whole log. Entries for one product are therefore also ordered by
/// sequence id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceId(i64);

impl SequenceId {
    /// Creates a sequence ID from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for SequenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SequenceId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<SequenceId> for i64 {
    fn from(id: SequenceId) -> Self {
        id.0
    }
}

/// Direction of a stock mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// Stock received into inventory (quantity increases).
    Receipt,
    /// Stock deducted to fulfill an order (quantity decreases).
    Order,
}

impl MutationKind {
    /// Returns the canonical string form, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Receipt => "Receipt",
            MutationKind::Order => "Order",
        }
    }

    /// Parses the canonical string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Receipt" => Some(MutationKind::Receipt),
            "Order" => Some(MutationKind::Order),
            _ => None,
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one stock mutation.
///
/// Exactly one entry exists per successful mutation; the pre/post
/// quantities capture the state transition applied to the stock record
/// within the same unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Log position, assigned by the store.
    pub sequence_id: SequenceId,

    /// Product the mutation applied to.
    pub product_id: ProductId,

    /// Item name snapshot at mutation time; may differ from the current
    /// record after later receipts rename the item.
    pub item_name: String,

    /// Quantity before the mutation.
    pub old_quantity: u32,

    /// Quantity after the mutation.
    pub new_quantity: u32,

    /// Direction of the mutation.
    pub kind: MutationKind,

    /// When the mutation was applied.
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Signed quantity change recorded by this entry.
    pub fn delta(&self) -> i64 {
        i64::from(self.new_quantity) - i64::from(self.old_quantity)
    }
}

/// An audit entry before the store has assigned its sequence id.
///
/// Drafts are built by the mutating caller and handed to the store
/// together with the updated record; only the store turns a draft into an
/// [`AuditEntry`], and only while committing the paired record write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    pub product_id: ProductId,
    pub item_name: String,
    pub old_quantity: u32,
    pub new_quantity: u32,
    pub kind: MutationKind,
    pub timestamp: DateTime<Utc>,
}

impl AuditDraft {
    /// Creates a draft stamped with the current time.
    pub fn new(
        product_id: impl Into<ProductId>,
        item_name: impl Into<String>,
        old_quantity: u32,
        new_quantity: u32,
        kind: MutationKind,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            item_name: item_name.into(),
            old_quantity,
            new_quantity,
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Seals the draft into an entry at the given log position.
    pub fn into_entry(self, sequence_id: SequenceId) -> AuditEntry {
        AuditEntry {
            sequence_id,
            product_id: self.product_id,
            item_name: self.item_name,
            old_quantity: self.old_quantity,
            new_quantity: self.new_quantity,
            kind: self.kind,
            timestamp: self.timestamp,
        }
    }
}
