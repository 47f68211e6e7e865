//! The order fulfillment engine.

use std::collections::HashMap;

use chrono::Utc;
use common::ProductId;
use inventory::{DeductStock, InventoryError, InventoryStore};
use ledger::{StockRecord, store::LedgerStore};

use crate::error::{CommittedLine, FailedLine, FulfillmentError, PartialFulfillment};
use crate::order::{Money, OrderRequest};
use crate::summary::{LineSummary, OrderSummary};

/// Executes multi-line orders against the inventory store.
///
/// The engine never touches presentation concerns; it turns a validated,
/// feasible request into per-line deductions and a priced summary.
pub struct OrderFulfillment<L: LedgerStore> {
    inventory: InventoryStore<L>,
}

impl<L: LedgerStore> OrderFulfillment<L> {
    /// Creates a new engine over an explicitly injected inventory store.
    pub fn new(inventory: InventoryStore<L>) -> Self {
        Self { inventory }
    }

    /// Returns a reference to the inventory store.
    pub fn inventory(&self) -> &InventoryStore<L> {
        &self.inventory
    }

    /// Validates, checks feasibility, and commits an order.
    ///
    /// Feasibility is all-or-nothing: requested quantities are aggregated
    /// per product and compared against current stock before any
    /// deduction, so an infeasible line rejects the whole order with zero
    /// state changes. The pre-check is fail-fast only; each line's
    /// conditional deduction remains the final authority, and a line that
    /// fails after earlier lines committed surfaces as
    /// [`FulfillmentError::Partial`].
    #[tracing::instrument(
        skip(self, request),
        fields(order_id = %request.order_id, lines = request.lines.len())
    )]
    pub async fn execute(&self, request: OrderRequest) -> Result<OrderSummary, FulfillmentError> {
        metrics::counter!("fulfillment_attempts_total").increment(1);
        let start = std::time::Instant::now();

        request.validate()?;
        self.check_feasibility(&request).await?;

        // Commit line by line, in request order. Deductions are
        // individually durable; there is no cross-line rollback.
        let mut lines: Vec<LineSummary> = Vec::with_capacity(request.lines.len());
        for (index, line) in request.lines.iter().enumerate() {
            let deducted = self
                .inventory
                .deduct_stock(DeductStock::new(line.product_id.clone(), line.quantity))
                .await;

            let record = match deducted {
                Ok(record) => record,
                Err(e) => {
                    return Err(self.commit_failure(&request, lines, index, e));
                }
            };

            lines.push(LineSummary {
                product_id: line.product_id.clone(),
                item_name: record.item_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total(),
                remaining_quantity: record.quantity,
            });
        }

        let mut grand_total = Money::zero();
        for line in &lines {
            grand_total += line.line_total;
        }

        let summary = OrderSummary {
            order_id: request.order_id,
            customer: request.customer,
            lines,
            grand_total,
            fulfilled_at: Utc::now(),
        };

        metrics::histogram!("fulfillment_duration_seconds").record(start.elapsed().as_secs_f64());
        metrics::counter!("fulfillment_completed").increment(1);
        tracing::info!(grand_total = %summary.grand_total, "order fulfilled");

        Ok(summary)
    }

    /// Verifies every line can be satisfied before any deduction.
    ///
    /// Requested quantities are aggregated per product so that two lines
    /// for the same product cannot pass individually and then jointly
    /// overdraw at commit.
    async fn check_feasibility(&self, request: &OrderRequest) -> Result<(), FulfillmentError> {
        let mut records: HashMap<ProductId, StockRecord> = HashMap::new();
        let mut required: HashMap<ProductId, u32> = HashMap::new();

        for line in &request.lines {
            if !records.contains_key(&line.product_id) {
                let record = self
                    .inventory
                    .get_by_id(&line.product_id)
                    .await
                    .map_err(|e| match e {
                        InventoryError::NotFound(id) => FulfillmentError::ProductNotFound(id),
                        other => FulfillmentError::Inventory(other),
                    })?;
                records.insert(line.product_id.clone(), record);
            }

            let total = required.entry(line.product_id.clone()).or_insert(0);
            *total = total.checked_add(line.quantity).ok_or_else(|| {
                FulfillmentError::InvalidRequest {
                    reason: format!(
                        "total requested quantity for product {} overflows",
                        line.product_id
                    ),
                }
            })?;

            let available = records[&line.product_id].quantity;
            if *total > available {
                metrics::counter!("fulfillment_rejected").increment(1);
                tracing::info!(
                    product_id = %line.product_id,
                    requested = *total,
                    available,
                    "order rejected: insufficient stock"
                );
                return Err(FulfillmentError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    requested: *total,
                    available,
                });
            }
        }

        Ok(())
    }

    /// Builds the error for a deduction that failed at commit time.
    ///
    /// With nothing committed yet the all-or-nothing outcome still holds
    /// and the cause surfaces directly; otherwise the caller gets the full
    /// reconciliation detail.
    fn commit_failure(
        &self,
        request: &OrderRequest,
        committed: Vec<LineSummary>,
        failed_index: usize,
        cause: InventoryError,
    ) -> FulfillmentError {
        let failed_line = &request.lines[failed_index];

        if committed.is_empty() {
            return match cause {
                InventoryError::InsufficientQuantity {
                    product_id,
                    requested,
                    available,
                } => FulfillmentError::InsufficientStock {
                    product_id,
                    requested,
                    available,
                },
                InventoryError::NotFound(id) => FulfillmentError::ProductNotFound(id),
                other => FulfillmentError::Inventory(other),
            };
        }

        metrics::counter!("fulfillment_partial").increment(1);
        tracing::warn!(
            order_id = %request.order_id,
            committed = committed.len(),
            failed_product = %failed_line.product_id,
            "order partially fulfilled"
        );

        let partial = PartialFulfillment {
            order_id: request.order_id,
            committed: committed
                .into_iter()
                .map(|line| CommittedLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    remaining_quantity: line.remaining_quantity,
                })
                .collect(),
            failed: FailedLine {
                product_id: failed_line.product_id.clone(),
                quantity: failed_line.quantity,
                reason: cause.to_string(),
            },
            unattempted: request.lines[failed_index + 1..]
                .iter()
                .map(|line| line.product_id.clone())
                .collect(),
        };

        FulfillmentError::Partial(Box::new(partial))
    }
}
