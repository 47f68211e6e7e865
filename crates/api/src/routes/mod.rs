//! Route handlers and shared application state.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod stock;

use fulfillment::OrderFulfillment;
use inventory::InventoryStore;
use ledger::store::LedgerStore;

/// Shared application state accessible from all handlers.
pub struct AppState<L: LedgerStore> {
    pub inventory: InventoryStore<L>,
    pub fulfillment: OrderFulfillment<L>,
}
