use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Account, Holding, PurchaseOrder, PurchaseOutcome};

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Persistence for accounts and holdings.
///
/// `execute_purchase` is all-or-nothing: either the debited account and the
/// accumulated holding are both stored, or nothing changes. Implementations
/// also serialize purchases that touch the same investor.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn open_account(&self, investor_id: &str, available_balance: &bigdecimal::BigDecimal)
        -> Result<Account, AppError>;

    async fn fetch_account(&self, investor_id: &str) -> Result<Option<Account>, AppError>;

    async fn fetch_holdings(&self, investor_id: &str) -> Result<Vec<Holding>, AppError>;

    async fn execute_purchase(&self, order: &PurchaseOrder) -> Result<PurchaseOutcome, AppError>;
}
