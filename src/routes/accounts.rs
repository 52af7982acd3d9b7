use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{AccountSummary, Holding, OpenAccount};
use crate::services::account_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(open_account))
        .route("/:investor_id", get(get_account))
        .route("/:investor_id/holdings", get(list_holdings))
}

pub async fn open_account(
    State(state): State<AppState>,
    payload: Result<Json<OpenAccount>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountSummary>), AppError> {
    info!("POST /accounts - Opening account");
    let Json(input) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let summary = account_service::open_account(state.store.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
) -> Result<Json<AccountSummary>, AppError> {
    info!("GET /accounts/{} - Fetching account", investor_id);
    let summary = account_service::get_summary(state.store.as_ref(), &investor_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch account {}: {}", investor_id, e);
            e
        })?;
    Ok(Json(summary))
}

pub async fn list_holdings(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
) -> Result<Json<Vec<Holding>>, AppError> {
    info!("GET /accounts/{}/holdings - Fetching holdings", investor_id);
    let holdings = account_service::list_holdings(state.store.as_ref(), &investor_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch holdings for investor {}: {}", investor_id, e);
            e
        })?;
    Ok(Json(holdings))
}
