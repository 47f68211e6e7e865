use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use crate::{
    AuditDraft, AuditEntry, AuditQuery, LedgerError, Result, SequenceId, StockRecord,
    store::{AuditStream, LedgerStore, MutationOutcome, validate_mutation},
};

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<ProductId, StockRecord>,
    entries: Vec<AuditEntry>,
    next_sequence: i64,
    fail_updates_after: Option<u32>,
}

/// In-memory ledger store.
///
/// Backs the server binary and the test suites; provides the same
/// interface and serialization guarantees as the PostgreSQL
/// implementation. All mutations run under a single write guard, so the
/// record write and the audit append commit together.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryLedger {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of audit entries stored.
    pub async fn entry_count(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Clears all records and entries.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.records.clear();
        inner.entries.clear();
        inner.next_sequence = 0;
    }

    /// Configures the store to fail with `Unavailable` after `n` more
    /// successful conditional updates. `n = 0` fails the next update.
    pub async fn fail_updates_after(&self, n: u32) {
        self.inner.write().await.fail_updates_after = Some(n);
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn get(&self, product_id: &ProductId) -> Result<Option<StockRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(product_id).cloned())
    }

    async fn list(&self) -> Result<Vec<StockRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<_> = inner.records.values().cloned().collect();
        records.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        Ok(records)
    }

    async fn update_conditional(
        &self,
        expected: Option<&StockRecord>,
        updated: StockRecord,
        draft: AuditDraft,
    ) -> Result<MutationOutcome> {
        let mut inner = self.inner.write().await;

        if let Some(remaining) = inner.fail_updates_after {
            if remaining == 0 {
                return Err(LedgerError::Unavailable("injected fault".to_string()));
            }
            inner.fail_updates_after = Some(remaining - 1);
        }

        validate_mutation(expected, &updated, &draft)
            .map_err(|e| LedgerError::RejectedMutation(e.message))?;

        let stored = inner.records.get(&updated.product_id);
        let matches = match (expected, stored) {
            (None, None) => true,
            (Some(expected), Some(stored)) => expected == stored,
            _ => false,
        };
        if !matches {
            tracing::debug!(product_id = %updated.product_id, "conditional update conflict");
            return Err(LedgerError::Conflict {
                product_id: updated.product_id.clone(),
            });
        }

        inner.next_sequence += 1;
        let entry = draft.into_entry(SequenceId::new(inner.next_sequence));

        inner
            .records
            .insert(updated.product_id.clone(), updated.clone());
        inner.entries.push(entry.clone());

        Ok(MutationOutcome {
            record: updated,
            entry,
        })
    }

    async fn audit_by_product(&self, product_id: &ProductId) -> Result<AuditStream> {
        use futures_util::stream;

        let inner = self.inner.read().await;
        let mut entries: Vec<_> = inner
            .entries
            .iter()
            .filter(|e| &e.product_id == product_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.sequence_id);

        let stream = stream::iter(entries.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn query_audit(&self, query: AuditQuery) -> Result<Vec<AuditEntry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<_> = inner
            .entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.sequence_id);

        let offset = query.offset.unwrap_or(0);
        let entries: Vec<_> = entries.into_iter().skip(offset).collect();

        let entries = if let Some(limit) = query.limit {
            entries.into_iter().take(limit).collect()
        } else {
            entries
        };

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MutationKind;
    use futures_util::TryStreamExt;

    fn record(product: &str, quantity: u32) -> StockRecord {
        StockRecord::new(product, "Widget", quantity, "B1")
    }

    fn receipt_draft(product: &str, old: u32, new: u32) -> AuditDraft {
        AuditDraft::new(product, "Widget", old, new, MutationKind::Receipt)
    }

    async fn seed(store: &InMemoryLedger, product: &str, quantity: u32) -> StockRecord {
        store
            .update_conditional(None, record(product, quantity), receipt_draft(product, 0, quantity))
            .await
            .unwrap()
            .record
    }

    #[tokio::test]
    async fn create_and_get() {
        let store = InMemoryLedger::new();
        let created = seed(&store, "P1", 10).await;

        let fetched = store.get(&ProductId::new("P1")).await.unwrap();
        assert_eq!(fetched, Some(created));
        assert_eq!(store.entry_count().await, 1);
    }

    #[tokio::test]
    async fn get_absent_product() {
        let store = InMemoryLedger::new();
        let fetched = store.get(&ProductId::new("P1")).await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn list_is_ordered_by_product_id() {
        let store = InMemoryLedger::new();
        seed(&store, "P2", 5).await;
        seed(&store, "P1", 3).await;

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].product_id.as_str(), "P1");
        assert_eq!(records[1].product_id.as_str(), "P2");
    }

    #[tokio::test]
    async fn sequence_ids_are_monotonic_across_products() {
        let store = InMemoryLedger::new();
        seed(&store, "P1", 10).await;
        let outcome = store
            .update_conditional(None, record("P2", 4), receipt_draft("P2", 0, 4))
            .await
            .unwrap();
        assert_eq!(outcome.entry.sequence_id, SequenceId::new(2));
    }

    #[tokio::test]
    async fn conflict_when_record_already_exists() {
        let store = InMemoryLedger::new();
        seed(&store, "P1", 10).await;

        let result = store
            .update_conditional(None, record("P1", 5), receipt_draft("P1", 0, 5))
            .await;
        assert!(matches!(result, Err(LedgerError::Conflict { .. })));
        // The losing write left no trace.
        assert_eq!(store.entry_count().await, 1);
        assert_eq!(
            store.get(&ProductId::new("P1")).await.unwrap().unwrap().quantity,
            10
        );
    }

    #[tokio::test]
    async fn conflict_when_stored_state_changed() {
        let store = InMemoryLedger::new();
        let original = seed(&store, "P1", 10).await;

        // Another writer bumps the record.
        store
            .update_conditional(
                Some(&original),
                record("P1", 15),
                receipt_draft("P1", 10, 15),
            )
            .await
            .unwrap();

        // A write conditioned on the stale read must fail.
        let result = store
            .update_conditional(
                Some(&original),
                record("P1", 12),
                receipt_draft("P1", 10, 12),
            )
            .await;
        assert!(matches!(result, Err(LedgerError::Conflict { .. })));
    }

    #[tokio::test]
    async fn conflict_when_record_vanished() {
        let store = InMemoryLedger::new();
        let phantom = record("P1", 10);

        let result = store
            .update_conditional(
                Some(&phantom),
                record("P1", 12),
                receipt_draft("P1", 10, 12),
            )
            .await;
        assert!(matches!(result, Err(LedgerError::Conflict { .. })));
    }

    #[tokio::test]
    async fn rejects_mispaired_draft() {
        let store = InMemoryLedger::new();

        // Draft claims 0 -> 9 but the record says 10.
        let result = store
            .update_conditional(None, record("P1", 10), receipt_draft("P1", 0, 9))
            .await;
        assert!(matches!(result, Err(LedgerError::RejectedMutation(_))));
        assert_eq!(store.entry_count().await, 0);
        assert!(store.get(&ProductId::new("P1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn audit_stream_is_sequence_ascending() {
        let store = InMemoryLedger::new();
        let r1 = seed(&store, "P1", 10).await;
        seed(&store, "P2", 4).await;
        store
            .update_conditional(
                Some(&r1),
                StockRecord::new("P1", "Widget", 3, "B1"),
                AuditDraft::new("P1", "Widget", 10, 3, MutationKind::Order),
            )
            .await
            .unwrap();

        let stream = store.audit_by_product(&ProductId::new("P1")).await.unwrap();
        let entries: Vec<_> = stream.try_collect().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[0].sequence_id < entries[1].sequence_id);
        assert_eq!(entries[0].new_quantity, 10);
        assert_eq!(entries[1].new_quantity, 3);
    }

    #[tokio::test]
    async fn audit_stream_is_restartable() {
        let store = InMemoryLedger::new();
        seed(&store, "P1", 10).await;

        for _ in 0..2 {
            let stream = store.audit_by_product(&ProductId::new("P1")).await.unwrap();
            let entries: Vec<_> = stream.try_collect().await.unwrap();
            assert_eq!(entries.len(), 1);
        }
    }

    #[tokio::test]
    async fn query_audit_with_filters() {
        let store = InMemoryLedger::new();
        let r1 = seed(&store, "P1", 10).await;
        seed(&store, "P2", 4).await;
        store
            .update_conditional(
                Some(&r1),
                StockRecord::new("P1", "Widget", 7, "B1"),
                AuditDraft::new("P1", "Widget", 10, 7, MutationKind::Order),
            )
            .await
            .unwrap();

        let receipts = store
            .query_audit(AuditQuery::new().kind(MutationKind::Receipt))
            .await
            .unwrap();
        assert_eq!(receipts.len(), 2);

        let p1 = store
            .query_audit(AuditQuery::new().product_id("P1"))
            .await
            .unwrap();
        assert_eq!(p1.len(), 2);

        let limited = store
            .query_audit(AuditQuery::new().limit(1).offset(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].sequence_id, SequenceId::new(2));
    }

    #[tokio::test]
    async fn injected_fault_surfaces_as_unavailable() {
        let store = InMemoryLedger::new();
        store.fail_updates_after(1).await;

        seed(&store, "P1", 10).await;

        let result = store
            .update_conditional(None, record("P2", 4), receipt_draft("P2", 0, 4))
            .await;
        assert!(matches!(result, Err(LedgerError::Unavailable(_))));
        // The failed update left no partial state.
        assert!(store.get(&ProductId::new("P2")).await.unwrap().is_none());
        assert_eq!(store.entry_count().await, 1);
    }
}
