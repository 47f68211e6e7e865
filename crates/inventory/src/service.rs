//! The inventory store service.

use common::ProductId;
use ledger::{
    AuditDraft, AuditEntry, AuditQuery, LedgerError, MutationKind, StockRecord,
    store::{AuditStream, LedgerStore},
};

use crate::commands::{DeductStock, ReceiveStock};
use crate::error::InventoryError;

/// The sole mutator of stock state.
///
/// Each mutation reads the current record, validates the delta, and
/// commits through the ledger's conditional update. A `Conflict` means a
/// concurrent writer committed first; the operation re-reads and
/// re-validates, so the check and the write are never observable as two
/// separate steps. Validation errors and persistence faults are never
/// retried.
#[derive(Clone)]
pub struct InventoryStore<L: LedgerStore> {
    ledger: L,
}

impl<L: LedgerStore> InventoryStore<L> {
    /// Creates a new inventory store over the given ledger.
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Returns a reference to the underlying ledger store.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Receives stock into inventory.
    ///
    /// Creates the record on first receipt (`old_quantity = 0`); otherwise
    /// adds the delta to the current quantity and overwrites the box
    /// location last-write-wins. The stored item name is set at creation
    /// and kept afterwards; the audit entry snapshots the name supplied
    /// with each mutation, which may therefore differ from the record's.
    /// Exactly one `Receipt` audit entry is committed with the record.
    #[tracing::instrument(skip(self))]
    pub async fn receive_stock(&self, cmd: ReceiveStock) -> Result<StockRecord, InventoryError> {
        if cmd.quantity == 0 {
            return Err(InventoryError::InvalidQuantity {
                product_id: cmd.product_id,
                quantity: cmd.quantity,
            });
        }

        loop {
            let current = self.ledger.get(&cmd.product_id).await?;
            let old_quantity = current.as_ref().map(|r| r.quantity).unwrap_or(0);
            let new_quantity = old_quantity.checked_add(cmd.quantity).ok_or_else(|| {
                InventoryError::InvalidQuantity {
                    product_id: cmd.product_id.clone(),
                    quantity: cmd.quantity,
                }
            })?;

            let stored_name = current
                .as_ref()
                .map(|r| r.item_name.clone())
                .unwrap_or_else(|| cmd.item_name.clone());
            let updated = StockRecord::new(
                cmd.product_id.clone(),
                stored_name,
                new_quantity,
                cmd.box_id.clone(),
            );
            let draft = AuditDraft::new(
                cmd.product_id.clone(),
                cmd.item_name.clone(),
                old_quantity,
                new_quantity,
                MutationKind::Receipt,
            );

            match self
                .ledger
                .update_conditional(current.as_ref(), updated, draft)
                .await
            {
                Ok(outcome) => {
                    metrics::counter!("stock_receipts_total").increment(1);
                    tracing::info!(
                        product_id = %outcome.record.product_id,
                        old_quantity,
                        new_quantity = outcome.record.quantity,
                        "stock received"
                    );
                    return Ok(outcome.record);
                }
                Err(LedgerError::Conflict { .. }) => {
                    // Lost the race; re-read and re-apply.
                    metrics::counter!("stock_mutation_conflicts_total").increment(1);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Deducts stock for an order.
    ///
    /// Fails with `NotFound` if no record exists and with
    /// `InsufficientQuantity` if the deduction would go below zero; in
    /// both cases no state changes and no audit entry is written. The
    /// insufficiency check re-runs on every conflict retry, so the
    /// conditional update is the final authority. On success exactly one
    /// `Order` audit entry is committed with the record.
    #[tracing::instrument(skip(self))]
    pub async fn deduct_stock(&self, cmd: DeductStock) -> Result<StockRecord, InventoryError> {
        if cmd.quantity == 0 {
            return Err(InventoryError::InvalidQuantity {
                product_id: cmd.product_id,
                quantity: cmd.quantity,
            });
        }

        loop {
            let current = self
                .ledger
                .get(&cmd.product_id)
                .await?
                .ok_or_else(|| InventoryError::NotFound(cmd.product_id.clone()))?;

            let new_quantity = current.quantity.checked_sub(cmd.quantity).ok_or_else(|| {
                InventoryError::InsufficientQuantity {
                    product_id: cmd.product_id.clone(),
                    requested: cmd.quantity,
                    available: current.quantity,
                }
            })?;

            let updated = StockRecord::new(
                current.product_id.clone(),
                current.item_name.clone(),
                new_quantity,
                current.box_id.clone(),
            );
            let draft = AuditDraft::new(
                current.product_id.clone(),
                current.item_name.clone(),
                current.quantity,
                new_quantity,
                MutationKind::Order,
            );

            match self
                .ledger
                .update_conditional(Some(&current), updated, draft)
                .await
            {
                Ok(outcome) => {
                    metrics::counter!("stock_deductions_total").increment(1);
                    tracing::info!(
                        product_id = %outcome.record.product_id,
                        old_quantity = current.quantity,
                        new_quantity = outcome.record.quantity,
                        "stock deducted"
                    );
                    return Ok(outcome.record);
                }
                Err(LedgerError::Conflict { .. }) => {
                    metrics::counter!("stock_mutation_conflicts_total").increment(1);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Retrieves the record for a product, failing with `NotFound` if
    /// absent.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, product_id: &ProductId) -> Result<StockRecord, InventoryError> {
        self.ledger
            .get(product_id)
            .await?
            .ok_or_else(|| InventoryError::NotFound(product_id.clone()))
    }

    /// Looks up a product; absence is not an error. Pure read, no audit
    /// entry is produced.
    #[tracing::instrument(skip(self))]
    pub async fn search(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<StockRecord>, InventoryError> {
        Ok(self.ledger.get(product_id).await?)
    }

    /// Retrieves all stock records, ordered by product id.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<StockRecord>, InventoryError> {
        Ok(self.ledger.list().await?)
    }

    /// Streams the audit trail for one product, sequence-ascending.
    pub async fn audit_trail(&self, product_id: &ProductId) -> Result<AuditStream, InventoryError> {
        Ok(self.ledger.audit_by_product(product_id).await?)
    }

    /// Retrieves audit entries matching a query.
    #[tracing::instrument(skip(self))]
    pub async fn audit(&self, query: AuditQuery) -> Result<Vec<AuditEntry>, InventoryError> {
        Ok(self.ledger.query_audit(query).await?)
    }
}
