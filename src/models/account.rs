use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::money;

// Virtual cash account of one investor. The investor id is the primary key, so
// there is never more than one account per investor.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub investor_id: String,
    #[serde(serialize_with = "money::serialize_as_number")]
    pub invested_balance: BigDecimal,
    #[serde(serialize_with = "money::serialize_as_number")]
    pub available_balance: BigDecimal,
    #[serde(serialize_with = "money::serialize_as_number")]
    pub blocked_balance: BigDecimal,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAccount {
    #[serde(default)]
    pub investor_id: String,
    #[serde(default, deserialize_with = "money::deserialize_lenient")]
    pub initial_balance: Option<BigDecimal>,
}

/// Account as shown on the dashboard, with the combined balance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    #[serde(flatten)]
    pub account: Account,
    #[serde(serialize_with = "money::serialize_as_number")]
    pub total_balance: BigDecimal,
}

impl Account {
    pub fn new(investor_id: String, available_balance: BigDecimal) -> Self {
        let now = chrono::Utc::now();
        Self {
            investor_id,
            invested_balance: money::round_cash(&money::zero()),
            available_balance: money::round_cash(&available_balance),
            blocked_balance: money::round_cash(&money::zero()),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        let total_balance =
            money::round_cash(&(&account.invested_balance + &account.available_balance));
        Self {
            account,
            total_balance,
        }
    }
}
