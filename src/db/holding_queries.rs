use sqlx::PgExecutor;

use crate::models::Holding;

pub async fn fetch_all<'e, E>(executor: E, investor_id: &str) -> Result<Vec<Holding>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Holding>(
        "SELECT id, investor_id, asset_symbol, category, quantity, total_cost, created_at, updated_at
         FROM holdings
         WHERE investor_id = $1
         ORDER BY asset_symbol ASC"
    )
    .bind(investor_id)
    .fetch_all(executor)
    .await
}

pub async fn fetch_for_update<'e, E>(
    executor: E,
    investor_id: &str,
    asset_symbol: &str,
) -> Result<Option<Holding>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Holding>(
        "SELECT id, investor_id, asset_symbol, category, quantity, total_cost, created_at, updated_at
         FROM holdings
         WHERE investor_id = $1 AND asset_symbol = $2
         FOR UPDATE"
    )
    .bind(investor_id)
    .bind(asset_symbol)
    .fetch_optional(executor)
    .await
}

/// Writes the already-accumulated holding. The unique key on
/// (investor_id, asset_symbol) guarantees a single row per asset.
pub async fn upsert<'e, E>(executor: E, holding: &Holding) -> Result<Holding, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Holding>(
        "INSERT INTO holdings (id, investor_id, asset_symbol, category, quantity, total_cost)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (investor_id, asset_symbol)
         DO UPDATE SET
             quantity = EXCLUDED.quantity,
             total_cost = EXCLUDED.total_cost,
             updated_at = NOW()
         RETURNING id, investor_id, asset_symbol, category, quantity, total_cost, created_at, updated_at"
    )
    .bind(holding.id)
    .bind(&holding.investor_id)
    .bind(&holding.asset_symbol)
    .bind(&holding.category)
    .bind(&holding.quantity)
    .bind(&holding.total_cost)
    .fetch_one(executor)
    .await
}
