use std::pin::Pin;

use async_trait::async_trait;
use common::ProductId;
use futures_core::Stream;

use crate::{AuditDraft, AuditEntry, AuditQuery, MutationKind, Result, StockRecord};

/// Result of a committed stock mutation: the persisted record and its
/// paired, sequenced audit entry. Both became visible together.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub record: StockRecord,
    pub entry: AuditEntry,
}

/// A lazy stream of audit entries, ordered by sequence id ascending.
///
/// The stream is finite and restartable: requesting it again replays the
/// entries from the start.
pub type AuditStream = Pin<Box<dyn Stream<Item = Result<AuditEntry>> + Send>>;

/// Core trait for ledger store implementations.
///
/// A ledger store owns the current stock records and the append-only audit
/// log. All implementations must be thread-safe (Send + Sync) and must
/// serialize mutations per product: `update_conditional` either commits
/// against exactly the state the caller observed, or fails with
/// [`LedgerError::Conflict`](crate::LedgerError::Conflict) and changes
/// nothing.
///
/// There is deliberately no free-standing audit append and no entry
/// update/delete: an entry can only be inserted as the paired half of a
/// record mutation, which enforces the append-only and no-orphan
/// invariants at the interface level.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Retrieves the current record for a product, if any.
    async fn get(&self, product_id: &ProductId) -> Result<Option<StockRecord>>;

    /// Retrieves all records, ordered by product id.
    async fn list(&self) -> Result<Vec<StockRecord>>;

    /// Conditionally replaces the record for one product and appends its
    /// paired audit entry in the same unit of work.
    ///
    /// `expected` is the record the caller read before computing the
    /// update; `None` asserts that no record exists yet. If the stored
    /// state differs, the call fails with `Conflict` and neither the
    /// record nor the entry is written. On success the store assigns the
    /// entry's sequence id and both writes become durable before the call
    /// returns.
    async fn update_conditional(
        &self,
        expected: Option<&StockRecord>,
        updated: StockRecord,
        draft: AuditDraft,
    ) -> Result<MutationOutcome>;

    /// Streams the audit entries for one product, sequence-ascending.
    async fn audit_by_product(&self, product_id: &ProductId) -> Result<AuditStream>;

    /// Retrieves audit entries matching a query, sequence-ascending.
    async fn query_audit(&self, query: AuditQuery) -> Result<Vec<AuditEntry>>;
}

/// Error returned when a drafted entry does not describe the submitted
/// record transition.
#[derive(Debug, Clone)]
pub struct MutationValidationError {
    pub message: String,
}

impl std::fmt::Display for MutationValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mutation validation error: {}", self.message)
    }
}

impl std::error::Error for MutationValidationError {}

fn invalid(message: impl Into<String>) -> MutationValidationError {
    MutationValidationError {
        message: message.into(),
    }
}

/// Validates that a draft entry and an updated record describe the same
/// transition from the expected state.
///
/// Both backends call this before committing, so a mis-paired entry
/// cannot be persisted regardless of which caller built it.
pub fn validate_mutation(
    expected: Option<&StockRecord>,
    updated: &StockRecord,
    draft: &AuditDraft,
) -> std::result::Result<(), MutationValidationError> {
    if draft.product_id != updated.product_id {
        return Err(invalid(format!(
            "entry is for product {} but the record is for {}",
            draft.product_id, updated.product_id
        )));
    }

    if let Some(expected) = expected
        && expected.product_id != updated.product_id
    {
        return Err(invalid(
            "expected and updated records are for different products",
        ));
    }

    let old_quantity = expected.map(|r| r.quantity).unwrap_or(0);
    if draft.old_quantity != old_quantity {
        return Err(invalid(format!(
            "entry old quantity {} does not match the observed quantity {}",
            draft.old_quantity, old_quantity
        )));
    }

    if draft.new_quantity != updated.quantity {
        return Err(invalid(format!(
            "entry new quantity {} does not match the updated quantity {}",
            draft.new_quantity, updated.quantity
        )));
    }

    match draft.kind {
        MutationKind::Receipt if draft.new_quantity <= draft.old_quantity => {
            Err(invalid("a receipt entry must record a quantity increase"))
        }
        MutationKind::Order if draft.new_quantity >= draft.old_quantity => {
            Err(invalid("an order entry must record a quantity decrease"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quantity: u32) -> StockRecord {
        StockRecord::new("P1", "Widget", quantity, "B1")
    }

    #[test]
    fn accepts_matching_receipt() {
        let updated = record(10);
        let draft = AuditDraft::new("P1", "Widget", 0, 10, MutationKind::Receipt);
        assert!(validate_mutation(None, &updated, &draft).is_ok());
    }

    #[test]
    fn accepts_matching_deduction() {
        let expected = record(10);
        let updated = record(3);
        let draft = AuditDraft::new("P1", "Widget", 10, 3, MutationKind::Order);
        assert!(validate_mutation(Some(&expected), &updated, &draft).is_ok());
    }

    #[test]
    fn rejects_product_mismatch() {
        let updated = record(10);
        let draft = AuditDraft::new("P2", "Widget", 0, 10, MutationKind::Receipt);
        assert!(validate_mutation(None, &updated, &draft).is_err());
    }

    #[test]
    fn rejects_old_quantity_mismatch() {
        let expected = record(5);
        let updated = record(8);
        let draft = AuditDraft::new("P1", "Widget", 4, 8, MutationKind::Receipt);
        assert!(validate_mutation(Some(&expected), &updated, &draft).is_err());
    }

    #[test]
    fn rejects_new_quantity_mismatch() {
        let updated = record(10);
        let draft = AuditDraft::new("P1", "Widget", 0, 9, MutationKind::Receipt);
        assert!(validate_mutation(None, &updated, &draft).is_err());
    }

    #[test]
    fn rejects_kind_contradicting_delta() {
        let expected = record(10);
        let updated = record(3);
        let draft = AuditDraft::new("P1", "Widget", 10, 3, MutationKind::Receipt);
        assert!(validate_mutation(Some(&expected), &updated, &draft).is_err());
    }
}
