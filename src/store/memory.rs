use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::errors::AppError;
use crate::models::{Account, Holding, PurchaseOrder, PurchaseOutcome, PurchaseStage};
use crate::services::purchase_service;
use crate::store::LedgerStore;

struct InvestorBook {
    account: Account,
    holdings: BTreeMap<String, Holding>,
}

/// In-process ledger used for local runs and tests.
///
/// Each investor's book sits behind its own mutex. A purchase computes the new
/// account and holding while holding that lock and only writes them back once
/// every check has passed.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    books: Arc<DashMap<String, Arc<Mutex<InvestorBook>>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, investor_id: &str) -> Option<Arc<Mutex<InvestorBook>>> {
        // Clone the Arc so the shard lock is released before the book is locked.
        self.books.get(investor_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of holding rows stored for the investor.
    pub fn holding_count(&self, investor_id: &str) -> usize {
        self.book(investor_id)
            .map(|book| book.lock().holdings.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn open_account(
        &self,
        investor_id: &str,
        available_balance: &BigDecimal,
    ) -> Result<Account, AppError> {
        match self.books.entry(investor_id.to_string()) {
            Entry::Occupied(_) => Err(AppError::AccountExists(investor_id.to_string())),
            Entry::Vacant(slot) => {
                let account = Account::new(investor_id.to_string(), available_balance.clone());
                slot.insert(Arc::new(Mutex::new(InvestorBook {
                    account: account.clone(),
                    holdings: BTreeMap::new(),
                })));
                Ok(account)
            }
        }
    }

    async fn fetch_account(&self, investor_id: &str) -> Result<Option<Account>, AppError> {
        Ok(self.book(investor_id).map(|book| book.lock().account.clone()))
    }

    async fn fetch_holdings(&self, investor_id: &str) -> Result<Vec<Holding>, AppError> {
        Ok(self
            .book(investor_id)
            .map(|book| book.lock().holdings.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn execute_purchase(&self, order: &PurchaseOrder) -> Result<PurchaseOutcome, AppError> {
        let book = self
            .book(&order.investor_id)
            .ok_or_else(|| AppError::AccountNotFound(order.investor_id.clone()))?;
        let mut book = book.lock();
        purchase_service::trace_stage(order, PurchaseStage::AccountLoaded);

        purchase_service::authorize_debit(&book.account, &order.total_amount)?;
        purchase_service::trace_stage(order, PurchaseStage::FundsAuthorized);

        let account = purchase_service::apply_debit(&book.account, &order.total_amount);
        let existing = book.holdings.get(&order.asset_symbol).cloned();
        let holding = purchase_service::upsert_holding(existing, order);

        book.account = account.clone();
        purchase_service::trace_stage(order, PurchaseStage::AccountUpdated);
        book.holdings.insert(order.asset_symbol.clone(), holding.clone());
        purchase_service::trace_stage(order, PurchaseStage::HoldingUpserted);

        Ok(PurchaseOutcome { account, holding })
    }
}
