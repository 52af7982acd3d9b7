mod account;
mod holding;
mod purchase;

pub use account::{Account, AccountSummary, OpenAccount};
pub use holding::Holding;
pub use purchase::{
    AssetClass, PurchaseOrder, PurchaseOutcome, PurchaseReceipt, PurchaseRequest, PurchaseStage,
};
