//! HTTP handlers for waste recording

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentCashier;
use crate::services::ledger::LedgerService;
use crate::services::product::ProductService;
use crate::services::waste::{
    CreateBatchInput, RecordWasteInput, WasteBatchRow, WasteBatchView, WasteRecordView,
    WasteService, WasteSummary,
};
use crate::AppState;

fn services(state: &AppState) -> (WasteService, ProductService) {
    let ledger = LedgerService::new(state.db.clone());
    (
        WasteService::new(state.db.clone(), ledger.clone()),
        ProductService::new(state.db.clone(), ledger),
    )
}

/// Batch with its member records
#[derive(Debug, Serialize)]
pub struct BatchDetail {
    #[serde(flatten)]
    pub batch: WasteBatchView,
    pub records: Vec<WasteRecordView>,
}

/// Record standalone waste
pub async fn record_waste(
    State(state): State<AppState>,
    current: CurrentCashier,
    Json(input): Json<RecordWasteInput>,
) -> AppResult<Json<WasteRecordView>> {
    let (waste, products) = services(&state);
    let record = waste
        .record_waste(
            current.0.shop_id,
            None,
            &products,
            input,
            Some(current.0.cashier_id),
        )
        .await?;
    Ok(Json(record))
}

/// List all waste records
pub async fn list_records(
    State(state): State<AppState>,
    current: CurrentCashier,
) -> AppResult<Json<Vec<WasteRecordView>>> {
    let (waste, _) = services(&state);
    let records = waste.list_records(current.0.shop_id).await?;
    Ok(Json(records))
}

/// Query for the waste summary window
#[derive(Debug, Deserialize)]
pub struct WasteSummaryQuery {
    pub days: Option<i32>,
}

/// Waste totals and per-reason breakdown, default window 30 days
pub async fn waste_summary(
    State(state): State<AppState>,
    current: CurrentCashier,
    Query(query): Query<WasteSummaryQuery>,
) -> AppResult<Json<WasteSummary>> {
    let (waste, _) = services(&state);
    let summary = waste
        .summarize_waste(current.0.shop_id, query.days.unwrap_or(30))
        .await?;
    Ok(Json(summary))
}

/// Open a draft waste batch
pub async fn create_batch(
    State(state): State<AppState>,
    current: CurrentCashier,
    Json(input): Json<CreateBatchInput>,
) -> AppResult<Json<WasteBatchRow>> {
    let (waste, _) = services(&state);
    let batch = waste
        .create_batch(current.0.shop_id, input, Some(current.0.cashier_id))
        .await?;
    Ok(Json(batch))
}

/// List waste batches
pub async fn list_batches(
    State(state): State<AppState>,
    current: CurrentCashier,
) -> AppResult<Json<Vec<WasteBatchView>>> {
    let (waste, _) = services(&state);
    let batches = waste.list_batches(current.0.shop_id).await?;
    Ok(Json(batches))
}

/// Get a batch with its records
pub async fn get_batch(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchDetail>> {
    let (waste, _) = services(&state);
    let (batch, records) = waste.get_batch(current.0.shop_id, batch_id).await?;
    Ok(Json(BatchDetail { batch, records }))
}

/// Add a waste record to a draft batch
pub async fn add_batch_item(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<RecordWasteInput>,
) -> AppResult<Json<WasteRecordView>> {
    let (waste, products) = services(&state);
    let record = waste
        .record_waste(
            current.0.shop_id,
            Some(batch_id),
            &products,
            input,
            Some(current.0.cashier_id),
        )
        .await?;
    Ok(Json(record))
}

/// Complete a draft batch
pub async fn complete_batch(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<WasteBatchView>> {
    let (waste, _) = services(&state);
    let batch = waste.complete_batch(current.0.shop_id, batch_id).await?;
    Ok(Json(batch))
}

/// Cancel a draft batch, restoring the stock its records deducted
pub async fn cancel_batch(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<WasteBatchRow>> {
    let (waste, _) = services(&state);
    let batch = waste
        .cancel_batch(current.0.shop_id, batch_id, Some(current.0.cashier_id))
        .await?;
    Ok(Json(batch))
}
