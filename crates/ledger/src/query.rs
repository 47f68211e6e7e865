use chrono::{DateTime, Utc};
use common::ProductId;

use crate::{AuditEntry, MutationKind};

/// Filter criteria for retrieving audit entries.
///
/// All filters are optional and combined with AND. Results are always
/// ordered by sequence id ascending.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Only entries for this product.
    pub product_id: Option<ProductId>,

    /// Only entries of this mutation kind.
    pub kind: Option<MutationKind>,

    /// Only entries at or after this instant.
    pub from_timestamp: Option<DateTime<Utc>>,

    /// Only entries at or before this instant.
    pub to_timestamp: Option<DateTime<Utc>>,

    /// Maximum number of entries to return.
    pub limit: Option<usize>,

    /// Number of entries to skip.
    pub offset: Option<usize>,
}

impl AuditQuery {
    /// Creates an empty query matching all entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by product.
    pub fn product_id(mut self, product_id: impl Into<ProductId>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// Filters by mutation kind.
    pub fn kind(mut self, kind: MutationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Filters by earliest timestamp (inclusive).
    pub fn from_timestamp(mut self, from: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(from);
        self
    }

    /// Filters by latest timestamp (inclusive).
    pub fn to_timestamp(mut self, to: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(to);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the entry passes every configured filter.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(ref id) = self.product_id
            && &entry.product_id != id
        {
            return false;
        }
        if let Some(kind) = self.kind
            && entry.kind != kind
        {
            return false;
        }
        if let Some(from) = self.from_timestamp
            && entry.timestamp < from
        {
            return false;
        }
        if let Some(to) = self.to_timestamp
            && entry.timestamp > to
        {
            return false;
        }
        true
    }
}
