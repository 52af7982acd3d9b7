use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::context::RequestContext;
use crate::errors::AppError;
use crate::models::{AssetClass, PurchaseReceipt, PurchaseRequest};
use crate::services::purchase_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/finance", get(acknowledge_finance).post(purchase_finance))
        .route("/crypto", post(purchase_crypto))
}

pub async fn acknowledge_finance() -> Json<Value> {
    info!("GET /purchase/finance - Acknowledgement");
    Json(json!({ "message": "Finance purchase endpoint" }))
}

pub async fn purchase_finance(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<PurchaseReceipt>, AppError> {
    info!(request_id = %ctx.request_id, "POST /purchase/finance - Recording purchase");
    record_purchase(state, ctx, AssetClass::Finance, payload).await
}

pub async fn purchase_crypto(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<PurchaseReceipt>, AppError> {
    info!(request_id = %ctx.request_id, "POST /purchase/crypto - Recording purchase");
    record_purchase(state, ctx, AssetClass::Crypto, payload).await
}

async fn record_purchase(
    state: AppState,
    ctx: RequestContext,
    asset_class: AssetClass,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<PurchaseReceipt>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        error!(request_id = %ctx.request_id, "Unreadable {} purchase body: {}", asset_class, rejection.body_text());
        AppError::Validation(rejection.body_text())
    })?;

    let receipt = purchase_service::purchase(
        state.store.as_ref(),
        &ctx,
        asset_class,
        request,
        state.purchase_timeout,
    )
    .await?;
    Ok(Json(receipt))
}
