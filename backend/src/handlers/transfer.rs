//! HTTP handlers for stock transfers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentCashier;
use crate::services::ledger::LedgerService;
use crate::services::product::ProductService;
use crate::services::transfer::{CreateTransferInput, TransferRow, TransferService};
use crate::AppState;
use shared::models::{BusinessImpact, TransferValidation};

fn services(state: &AppState) -> (TransferService, ProductService) {
    let ledger = LedgerService::new(state.db.clone());
    (
        TransferService::new(state.db.clone(), ledger.clone()),
        ProductService::new(state.db.clone(), ledger),
    )
}

/// Transfer creation response with its validation result
#[derive(Debug, Serialize)]
pub struct TransferCreated {
    #[serde(flatten)]
    pub transfer: TransferRow,
    pub validation: TransferValidation,
}

/// Create a pending transfer
pub async fn create_transfer(
    State(state): State<AppState>,
    current: CurrentCashier,
    Json(input): Json<CreateTransferInput>,
) -> AppResult<Json<TransferCreated>> {
    let (transfers, products) = services(&state);
    let (transfer, validation) = transfers
        .create_transfer(
            current.0.shop_id,
            &products,
            input,
            Some(current.0.cashier_id),
        )
        .await?;
    Ok(Json(TransferCreated {
        transfer,
        validation,
    }))
}

/// List transfers
pub async fn list_transfers(
    State(state): State<AppState>,
    current: CurrentCashier,
) -> AppResult<Json<Vec<TransferRow>>> {
    let (transfers, _) = services(&state);
    let list = transfers.list_transfers(current.0.shop_id).await?;
    Ok(Json(list))
}

/// Get a transfer
pub async fn get_transfer(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<TransferRow>> {
    let (transfers, _) = services(&state);
    let transfer = transfers.get_transfer(current.0.shop_id, transfer_id).await?;
    Ok(Json(transfer))
}

/// Validate a pending transfer without processing it
pub async fn validate_transfer(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<TransferValidation>> {
    let (transfers, products) = services(&state);
    let transfer = transfers.get_transfer(current.0.shop_id, transfer_id).await?;
    let validation = transfers
        .validate_transfer(current.0.shop_id, &products, &transfer)
        .await?;
    Ok(Json(validation))
}

/// Process a pending transfer
pub async fn process_transfer(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<TransferRow>> {
    let (transfers, products) = services(&state);
    let transfer = transfers
        .process_transfer(current.0.shop_id, &products, transfer_id)
        .await?;
    Ok(Json(transfer))
}

/// Cancel a pending transfer
pub async fn cancel_transfer(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<TransferRow>> {
    let (transfers, _) = services(&state);
    let transfer = transfers
        .cancel_transfer(current.0.shop_id, transfer_id)
        .await?;
    Ok(Json(transfer))
}

/// Business-impact analysis of a processed transfer
pub async fn business_impact(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<BusinessImpact>> {
    let (transfers, _) = services(&state);
    let impact = transfers
        .business_impact_analysis(current.0.shop_id, transfer_id)
        .await?;
    Ok(Json(impact))
}
