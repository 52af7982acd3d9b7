use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;
use tracing::error;

use crate::db::{account_queries, holding_queries};
use crate::errors::AppError;
use crate::models::{Account, Holding, PurchaseOrder, PurchaseOutcome, PurchaseStage};
use crate::services::purchase_service;
use crate::store::LedgerStore;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code == UNIQUE_VIOLATION)
        .unwrap_or(false)
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn open_account(
        &self,
        investor_id: &str,
        available_balance: &BigDecimal,
    ) -> Result<Account, AppError> {
        account_queries::create(&self.pool, investor_id, available_balance)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::AccountExists(investor_id.to_string())
                } else {
                    error!("Failed to open account for investor {}: {}", investor_id, e);
                    AppError::Db(e)
                }
            })
    }

    async fn fetch_account(&self, investor_id: &str) -> Result<Option<Account>, AppError> {
        Ok(account_queries::fetch_one(&self.pool, investor_id).await?)
    }

    async fn fetch_holdings(&self, investor_id: &str) -> Result<Vec<Holding>, AppError> {
        Ok(holding_queries::fetch_all(&self.pool, investor_id).await?)
    }

    async fn execute_purchase(&self, order: &PurchaseOrder) -> Result<PurchaseOutcome, AppError> {
        // Dropping the transaction without commit rolls it back, which also
        // covers early returns and a cancelled (timed out) future.
        let mut tx = self.pool.begin().await.map_err(AppError::persistence)?;

        let locked = account_queries::fetch_for_update(&mut *tx, &order.investor_id)
            .await
            .map_err(AppError::persistence)?;
        let account = purchase_service::require_account(locked, &order.investor_id)?;
        purchase_service::trace_stage(order, PurchaseStage::AccountLoaded);

        purchase_service::authorize_debit(&account, &order.total_amount)?;
        purchase_service::trace_stage(order, PurchaseStage::FundsAuthorized);

        let debited = purchase_service::apply_debit(&account, &order.total_amount);
        let account = account_queries::update_balances(&mut *tx, &debited)
            .await
            .map_err(AppError::persistence)?
            .ok_or_else(|| AppError::Persistence("account row disappeared during update".into()))?;
        purchase_service::trace_stage(order, PurchaseStage::AccountUpdated);

        let existing =
            holding_queries::fetch_for_update(&mut *tx, &order.investor_id, &order.asset_symbol)
                .await
                .map_err(AppError::persistence)?;
        let holding = purchase_service::upsert_holding(existing, order);
        let holding = holding_queries::upsert(&mut *tx, &holding)
            .await
            .map_err(AppError::persistence)?;
        purchase_service::trace_stage(order, PurchaseStage::HoldingUpserted);

        tx.commit().await.map_err(AppError::persistence)?;

        Ok(PurchaseOutcome { account, holding })
    }
}
