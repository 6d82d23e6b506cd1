//! HTTP handlers for expenses and staff lunches

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentCashier;
use crate::services::expense::{CreateExpenseInput, ExpenseRow, ExpenseService};
use crate::services::ledger::LedgerService;
use crate::services::product::ProductService;
use crate::AppState;

fn services(state: &AppState) -> (ExpenseService, ProductService) {
    let ledger = LedgerService::new(state.db.clone());
    (
        ExpenseService::new(state.db.clone(), ledger.clone()),
        ProductService::new(state.db.clone(), ledger),
    )
}

/// Listing query parameters
#[derive(Debug, Deserialize)]
pub struct ListExpensesQuery {
    pub category: Option<String>,
}

/// Record an expense
pub async fn create_expense(
    State(state): State<AppState>,
    current: CurrentCashier,
    Json(input): Json<CreateExpenseInput>,
) -> AppResult<Json<ExpenseRow>> {
    let (expenses, products) = services(&state);
    let expense = expenses
        .create_expense(
            current.0.shop_id,
            &products,
            input,
            Some(current.0.cashier_id),
        )
        .await?;
    Ok(Json(expense))
}

/// List expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    current: CurrentCashier,
    Query(query): Query<ListExpensesQuery>,
) -> AppResult<Json<Vec<ExpenseRow>>> {
    let (expenses, _) = services(&state);
    let list = expenses
        .list_expenses(current.0.shop_id, query.category)
        .await?;
    Ok(Json(list))
}
