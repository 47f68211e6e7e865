//! Stock management endpoints for the inventory UI collaborator.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use common::ProductId;
use inventory::ReceiveStock;
use ledger::{AuditEntry, AuditQuery, MutationKind, StockRecord};
use ledger::store::LedgerStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct ReceiveStockRequest {
    pub product_id: String,
    pub item_name: String,
    pub quantity: u32,
    pub box_id: String,
}

#[derive(Deserialize, Default)]
pub struct AuditParams {
    pub kind: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// -- Response types --

#[derive(Serialize)]
pub struct StockRecordResponse {
    pub product_id: String,
    pub item_name: String,
    pub quantity: u32,
    pub box_id: String,
}

impl From<StockRecord> for StockRecordResponse {
    fn from(record: StockRecord) -> Self {
        Self {
            product_id: record.product_id.to_string(),
            item_name: record.item_name,
            quantity: record.quantity,
            box_id: record.box_id.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct AuditEntryResponse {
    pub sequence_id: i64,
    pub product_id: String,
    pub item_name: String,
    pub old_quantity: u32,
    pub new_quantity: u32,
    pub kind: String,
    pub timestamp: String,
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(entry: AuditEntry) -> Self {
        Self {
            sequence_id: entry.sequence_id.as_i64(),
            product_id: entry.product_id.to_string(),
            item_name: entry.item_name,
            old_quantity: entry.old_quantity,
            new_quantity: entry.new_quantity,
            kind: entry.kind.to_string(),
            timestamp: entry.timestamp.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /stock/receipts — receive stock, creating the record on first
/// receipt.
#[tracing::instrument(skip(state, req))]
pub async fn receive<L: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<ReceiveStockRequest>,
) -> Result<Json<StockRecordResponse>, ApiError> {
    let record = state
        .inventory
        .receive_stock(ReceiveStock::new(
            req.product_id.as_str(),
            req.item_name.as_str(),
            req.quantity,
            req.box_id.as_str(),
        ))
        .await?;

    Ok(Json(record.into()))
}

/// GET /stock — list all stock records.
#[tracing::instrument(skip(state))]
pub async fn list<L: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
) -> Result<Json<Vec<StockRecordResponse>>, ApiError> {
    let records = state.inventory.list().await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// GET /stock/:product_id — look up one product.
#[tracing::instrument(skip(state))]
pub async fn search<L: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(product_id): Path<String>,
) -> Result<Json<StockRecordResponse>, ApiError> {
    let record = state
        .inventory
        .search(&ProductId::new(product_id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {product_id} not found")))?;

    Ok(Json(record.into()))
}

/// GET /stock/:product_id/audit — the product's audit trail, oldest
/// first, with optional kind/timestamp-range/limit filters.
#[tracing::instrument(skip(state, params))]
pub async fn audit<L: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(product_id): Path<String>,
    Query(params): Query<AuditParams>,
) -> Result<Json<Vec<AuditEntryResponse>>, ApiError> {
    let mut query = AuditQuery::new().product_id(product_id.as_str());

    if let Some(ref kind) = params.kind {
        let kind = MutationKind::parse(kind)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown mutation kind {kind:?}")))?;
        query = query.kind(kind);
    }
    if let Some(from) = params.from {
        query = query.from_timestamp(from);
    }
    if let Some(to) = params.to {
        query = query.to_timestamp(to);
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    if let Some(offset) = params.offset {
        query = query.offset(offset);
    }

    let entries = state.inventory.audit(query).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
