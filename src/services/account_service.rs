use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{Account, AccountSummary, Holding, OpenAccount};
use crate::services::purchase_service;
use crate::store::LedgerStore;
use crate::utils::money;

pub async fn open_account(store: &dyn LedgerStore, input: OpenAccount) -> Result<AccountSummary, AppError> {
    let investor_id = input.investor_id.trim().to_string();
    if investor_id.is_empty() {
        return Err(AppError::Validation("investorId cannot be empty".into()));
    }
    let initial_balance = input.initial_balance.unwrap_or_else(money::zero);
    if money::is_negative(&initial_balance) {
        return Err(AppError::Validation("initialBalance cannot be negative".into()));
    }
    let initial_balance = money::round_cash(&initial_balance);

    let account = store.open_account(&investor_id, &initial_balance).await.map_err(|e| {
        error!("Failed to open account for investor {}: {}", investor_id, e);
        e
    })?;
    info!(
        investor_id = %account.investor_id,
        available = %account.available_balance,
        "Account opened"
    );
    Ok(AccountSummary::from(account))
}

// Read paths answer 404 for an unknown investor, unlike purchases.
async fn require_existing(store: &dyn LedgerStore, investor_id: &str) -> Result<Account, AppError> {
    purchase_service::load_account(store, investor_id)
        .await
        .map_err(|e| match e {
            AppError::AccountNotFound(id) => AppError::NotFound(format!("Account {} not found", id)),
            other => other,
        })
}

pub async fn get_summary(store: &dyn LedgerStore, investor_id: &str) -> Result<AccountSummary, AppError> {
    require_existing(store, investor_id).await.map(AccountSummary::from)
}

pub async fn list_holdings(store: &dyn LedgerStore, investor_id: &str) -> Result<Vec<Holding>, AppError> {
    require_existing(store, investor_id).await?;
    let mut holdings = store.fetch_holdings(investor_id).await?;
    holdings.sort_by(|a, b| a.asset_symbol.cmp(&b.asset_symbol));
    Ok(holdings)
}
