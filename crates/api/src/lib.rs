//! HTTP API server with observability for the stock ledger.
//!
//! Provides REST endpoints for stock management and order fulfillment,
//! with structured logging (tracing) and Prometheus metrics. This is the
//! surface the inventory-management UI and the document-rendering
//! collaborator talk to; the core never renders anything itself.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use fulfillment::OrderFulfillment;
use inventory::InventoryStore;
use ledger::store::LedgerStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L: LedgerStore + Clone + 'static>(
    state: Arc<AppState<L>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/stock/receipts", post(routes::stock::receive::<L>))
        .route("/stock", get(routes::stock::list::<L>))
        .route("/stock/{product_id}", get(routes::stock::search::<L>))
        .route("/stock/{product_id}/audit", get(routes::stock::audit::<L>))
        .route("/orders", post(routes::orders::execute::<L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over one ledger handle.
///
/// The inventory store and the fulfillment engine are constructed once
/// here and injected explicitly; nothing reaches for a process-wide
/// handle.
pub fn create_default_state<L: LedgerStore + Clone + 'static>(ledger: L) -> Arc<AppState<L>> {
    let inventory = InventoryStore::new(ledger);
    let fulfillment = OrderFulfillment::new(inventory.clone());

    Arc::new(AppState {
        inventory,
        fulfillment,
    })
}
