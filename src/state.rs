use std::sync::Arc;
use std::time::Duration;

use crate::store::LedgerStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub purchase_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, purchase_timeout: Duration) -> Self {
        Self {
            store,
            purchase_timeout,
        }
    }
}
