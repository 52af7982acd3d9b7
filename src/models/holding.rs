use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::utils::money;

// Accumulated simulated position of one investor in one asset.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: uuid::Uuid,
    pub investor_id: String,
    pub asset_symbol: String,
    pub category: String,
    #[serde(serialize_with = "money::serialize_as_number")]
    pub quantity: BigDecimal,
    #[serde(serialize_with = "money::serialize_as_number")]
    pub total_cost: BigDecimal,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Holding {
    pub fn new(
        investor_id: String,
        asset_symbol: String,
        category: String,
        quantity: BigDecimal,
        total_cost: BigDecimal,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            investor_id,
            asset_symbol,
            category,
            quantity,
            total_cost,
            created_at: now,
            updated_at: now,
        }
    }
}
