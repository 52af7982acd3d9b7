use bigdecimal::BigDecimal;
use sqlx::PgExecutor;

use crate::models::Account;

pub async fn fetch_one<'e, E>(executor: E, investor_id: &str) -> Result<Option<Account>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        "SELECT investor_id, invested_balance, available_balance, blocked_balance, created_at, updated_at
         FROM accounts
         WHERE investor_id = $1"
    )
    .bind(investor_id)
    .fetch_optional(executor)
    .await
}

/// Reads the account and holds its row lock until the surrounding transaction
/// ends, so purchases for the same investor run one after another.
pub async fn fetch_for_update<'e, E>(executor: E, investor_id: &str) -> Result<Option<Account>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        "SELECT investor_id, invested_balance, available_balance, blocked_balance, created_at, updated_at
         FROM accounts
         WHERE investor_id = $1
         FOR UPDATE"
    )
    .bind(investor_id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e, E>(
    executor: E,
    investor_id: &str,
    available_balance: &BigDecimal,
) -> Result<Account, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (investor_id, invested_balance, available_balance, blocked_balance)
         VALUES ($1, 0, $2, 0)
         RETURNING investor_id, invested_balance, available_balance, blocked_balance, created_at, updated_at"
    )
    .bind(investor_id)
    .bind(available_balance)
    .fetch_one(executor)
    .await
}

pub async fn update_balances<'e, E>(executor: E, account: &Account) -> Result<Option<Account>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        "UPDATE accounts
         SET invested_balance = $2, available_balance = $3, updated_at = NOW()
         WHERE investor_id = $1
         RETURNING investor_id, invested_balance, available_balance, blocked_balance, created_at, updated_at"
    )
    .bind(&account.investor_id)
    .bind(&account.invested_balance)
    .bind(&account.available_balance)
    .fetch_optional(executor)
    .await
}
