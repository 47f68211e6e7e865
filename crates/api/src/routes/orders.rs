//! Order execution endpoint for the document-rendering collaborator.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use fulfillment::{CustomerDetails, Money, OrderLine, OrderRequest, OrderSummary};
use ledger::store::LedgerStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct ExecuteOrderRequest {
    pub customer: CustomerRequest,
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    pub address: String,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub order_id: String,
    pub customer_name: String,
    pub customer_address: String,
    pub lines: Vec<LineSummaryResponse>,
    pub grand_total_cents: i64,
    pub fulfilled_at: String,
}

#[derive(Serialize)]
pub struct LineSummaryResponse {
    pub product_id: String,
    pub item_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub remaining_quantity: u32,
}

impl From<OrderSummary> for OrderSummaryResponse {
    fn from(summary: OrderSummary) -> Self {
        Self {
            order_id: summary.order_id.to_string(),
            customer_name: summary.customer.name,
            customer_address: summary.customer.address,
            lines: summary
                .lines
                .into_iter()
                .map(|line| LineSummaryResponse {
                    product_id: line.product_id.to_string(),
                    item_name: line.item_name,
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                    line_total_cents: line.line_total.cents(),
                    remaining_quantity: line.remaining_quantity,
                })
                .collect(),
            grand_total_cents: summary.grand_total.cents(),
            fulfilled_at: summary.fulfilled_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — execute a multi-line order and return the priced
/// summary.
#[tracing::instrument(skip(state, req))]
pub async fn execute<L: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<ExecuteOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderSummaryResponse>), ApiError> {
    let lines = req
        .lines
        .iter()
        .map(|line| {
            OrderLine::new(
                line.product_id.as_str(),
                line.quantity,
                Money::from_cents(line.unit_price_cents),
            )
        })
        .collect();

    let request = OrderRequest::new(
        CustomerDetails::new(req.customer.name.as_str(), req.customer.address.as_str()),
        lines,
    );

    let summary = state.fulfillment.execute(request).await?;

    Ok((axum::http::StatusCode::CREATED, Json(summary.into())))
}
