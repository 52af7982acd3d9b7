use std::time::Duration;

use bigdecimal::BigDecimal;
use tracing::{debug, error, info, warn};

use crate::context::RequestContext;
use crate::errors::AppError;
use crate::models::{
    Account, AssetClass, Holding, PurchaseOrder, PurchaseReceipt, PurchaseRequest, PurchaseStage,
};
use crate::store::LedgerStore;
use crate::utils::money;

/// Checks presence and sign of every field and normalizes them into an order.
///
/// A field counts as missing when it is absent, null, blank, or zero.
pub fn validate(request: PurchaseRequest, asset_class: AssetClass) -> Result<PurchaseOrder, AppError> {
    // Comparisons rescale both operands, so bounds come before any of them.
    for (field, value) in [("quantity", &request.quantity), ("unitPrice", &request.unit_price)] {
        if let Some(value) = value {
            money::check_bounds(value).map_err(|e| AppError::Validation(format!("{}: {}", field, e)))?;
        }
    }

    let investor_id = non_blank(request.investor_id);
    let asset_symbol = non_blank(request.asset_symbol).map(|s| s.to_uppercase());
    let category = non_blank(request.category);
    let quantity = request.quantity.filter(|q| *q != money::zero());
    let unit_price = request.unit_price.filter(|p| *p != money::zero());

    let mut missing = Vec::new();
    if investor_id.is_none() {
        missing.push("investorId");
    }
    if asset_symbol.is_none() {
        missing.push("assetSymbol");
    }
    if category.is_none() {
        missing.push("category");
    }
    if quantity.is_none() {
        missing.push("quantity");
    }
    if unit_price.is_none() {
        missing.push("unitPrice");
    }

    let (Some(investor_id), Some(asset_symbol), Some(category), Some(quantity), Some(unit_price)) =
        (investor_id, asset_symbol, category, quantity, unit_price)
    else {
        return Err(AppError::Validation(format!(
            "Required fields missing: {}",
            missing.join(", ")
        )));
    };

    if money::is_negative(&quantity) {
        return Err(AppError::Validation("quantity must be positive".into()));
    }
    if money::is_negative(&unit_price) {
        return Err(AppError::Validation("unitPrice must be positive".into()));
    }

    let quantity = money::round_quantity(&quantity);
    let unit_price = money::round_quantity(&unit_price);
    if !money::is_positive(&quantity) {
        return Err(AppError::Validation("quantity is below the smallest tradable unit".into()));
    }
    if !money::is_positive(&unit_price) {
        return Err(AppError::Validation("unitPrice is below the smallest tradable unit".into()));
    }

    let total_amount = compute_total(&quantity, &unit_price);
    if !money::is_positive(&total_amount) {
        return Err(AppError::Validation("purchase amount rounds to zero".into()));
    }

    Ok(PurchaseOrder {
        asset_class,
        investor_id,
        asset_symbol,
        category,
        quantity,
        unit_price,
        total_amount,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Cash cost of a purchase, rounded to cents half away from zero.
pub fn compute_total(quantity: &BigDecimal, unit_price: &BigDecimal) -> BigDecimal {
    money::round_cash(&(quantity * unit_price))
}

pub fn authorize_debit(account: &Account, amount: &BigDecimal) -> Result<(), AppError> {
    if account.available_balance < *amount {
        return Err(AppError::InsufficientFunds {
            available: account.available_balance.clone(),
            requested: amount.clone(),
        });
    }
    Ok(())
}

/// Moves `amount` from available to invested on a copy of the account.
pub fn apply_debit(account: &Account, amount: &BigDecimal) -> Account {
    let mut updated = account.clone();
    updated.invested_balance = money::round_cash(&(&account.invested_balance + amount));
    updated.available_balance = money::round_cash(&(&account.available_balance - amount));
    updated.updated_at = chrono::Utc::now();
    updated
}

/// Accumulates the order into the existing holding, or opens a new one.
pub fn upsert_holding(existing: Option<Holding>, order: &PurchaseOrder) -> Holding {
    match existing {
        Some(mut holding) => {
            holding.quantity = money::round_quantity(&(&holding.quantity + &order.quantity));
            holding.total_cost = money::round_cash(&(&holding.total_cost + &order.total_amount));
            holding.updated_at = chrono::Utc::now();
            holding
        }
        None => Holding::new(
            order.investor_id.clone(),
            order.asset_symbol.clone(),
            order.category.clone(),
            order.quantity.clone(),
            order.total_amount.clone(),
        ),
    }
}

/// Turns the result of an account lookup into the account or `AccountNotFound`.
pub fn require_account(found: Option<Account>, investor_id: &str) -> Result<Account, AppError> {
    found.ok_or_else(|| AppError::AccountNotFound(investor_id.to_string()))
}

/// Reads the investor's account outside of a purchase.
pub async fn load_account(store: &dyn LedgerStore, investor_id: &str) -> Result<Account, AppError> {
    require_account(store.fetch_account(investor_id).await?, investor_id)
}

pub(crate) fn trace_stage(order: &PurchaseOrder, stage: PurchaseStage) {
    debug!(
        investor_id = %order.investor_id,
        asset = %order.asset_symbol,
        asset_class = %order.asset_class,
        ?stage,
        "purchase stage reached"
    );
}

/// Validates the request and executes it as one atomic unit of work. Both
/// steps run inside the `timeout` budget.
pub async fn purchase(
    store: &dyn LedgerStore,
    ctx: &RequestContext,
    asset_class: AssetClass,
    request: PurchaseRequest,
    timeout: Duration,
) -> Result<PurchaseReceipt, AppError> {
    debug!(request_id = %ctx.request_id, stage = ?PurchaseStage::Received, %asset_class, "purchase received");
    let investor_id = request.investor_id.clone().unwrap_or_default();

    let work = async {
        let order = validate(request, asset_class)?;
        trace_stage(&order, PurchaseStage::Validated);
        info!(
            request_id = %ctx.request_id,
            investor_id = %order.investor_id,
            asset = %order.asset_symbol,
            quantity = %order.quantity,
            unit_price = %order.unit_price,
            total = %order.total_amount,
            "Starting {} purchase",
            asset_class
        );
        let outcome = store.execute_purchase(&order).await?;
        Ok::<_, AppError>((order, outcome))
    };

    let result = match tokio::time::timeout(timeout, work).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(timeout)),
    };

    match result {
        Ok((order, outcome)) => {
            trace_stage(&order, PurchaseStage::Succeeded);
            info!(
                request_id = %ctx.request_id,
                investor_id = %order.investor_id,
                asset = %order.asset_symbol,
                holding_quantity = %outcome.holding.quantity,
                invested = %outcome.account.invested_balance,
                available = %outcome.account.available_balance,
                "Purchase completed"
            );
            Ok(PurchaseReceipt::new(asset_class, &outcome.account))
        }
        Err(e) => {
            let stage = PurchaseStage::for_error(&e);
            if stage.is_rejection() {
                warn!(request_id = %ctx.request_id, %investor_id, %asset_class, ?stage, "Purchase rejected: {}", e);
            } else {
                error!(
                    request_id = %ctx.request_id,
                    %investor_id,
                    %asset_class,
                    ?stage,
                    kind = ?e.kind(),
                    "Purchase failed: {}",
                    e
                );
            }
            Err(e)
        }
    }
}
