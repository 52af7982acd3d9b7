use std::fmt;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{Account, Holding};
use crate::utils::money;

/// Which purchase endpoint a request came through. Business rules are the same
/// for both; only the confirmation message and log label differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Finance,
    Crypto,
}

impl AssetClass {
    pub fn success_message(&self) -> &'static str {
        match self {
            AssetClass::Finance => "Purchase completed successfully",
            AssetClass::Crypto => "Crypto purchase completed successfully",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Finance => write!(f, "finance"),
            AssetClass::Crypto => write!(f, "crypto"),
        }
    }
}

/// Raw purchase body. Every field is optional here so that presence is checked
/// by the validator rather than rejected by the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    #[serde(default, deserialize_with = "deserialize_identifier")]
    pub investor_id: Option<String>,
    #[serde(default)]
    pub asset_symbol: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "money::deserialize_lenient")]
    pub quantity: Option<BigDecimal>,
    #[serde(default, deserialize_with = "money::deserialize_lenient")]
    pub unit_price: Option<BigDecimal>,
}

/// A validated and normalized purchase, ready to be executed by a store.
#[derive(Debug, Clone)]
pub struct PurchaseOrder {
    pub asset_class: AssetClass,
    pub investor_id: String,
    pub asset_symbol: String,
    pub category: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub total_amount: BigDecimal,
}

/// State persisted by a successful purchase.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub account: Account,
    pub holding: Holding,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub message: String,
    #[serde(serialize_with = "money::serialize_as_number")]
    pub new_invested_balance: BigDecimal,
    #[serde(serialize_with = "money::serialize_as_number")]
    pub new_available_balance: BigDecimal,
}

impl PurchaseReceipt {
    pub fn new(asset_class: AssetClass, account: &Account) -> Self {
        Self {
            message: asset_class.success_message().to_string(),
            new_invested_balance: account.invested_balance.clone(),
            new_available_balance: account.available_balance.clone(),
        }
    }
}

/// Steps of a single purchase. The sequence is linear; any step may end in one
/// of the failure terminals instead of moving on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStage {
    Received,
    Validated,
    AccountLoaded,
    FundsAuthorized,
    AccountUpdated,
    HoldingUpserted,
    Succeeded,
    ValidationFailed,
    AccountNotFound,
    InsufficientFunds,
    PersistenceError,
    TimedOut,
}

impl PurchaseStage {
    /// Terminal stage a purchase ends in when it fails with `err`.
    pub fn for_error(err: &AppError) -> Self {
        match err {
            AppError::Validation(_) => PurchaseStage::ValidationFailed,
            AppError::AccountNotFound(_) => PurchaseStage::AccountNotFound,
            AppError::InsufficientFunds { .. } => PurchaseStage::InsufficientFunds,
            AppError::Timeout(_) => PurchaseStage::TimedOut,
            _ => PurchaseStage::PersistenceError,
        }
    }

    /// Failures caused by the request itself rather than by the service.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PurchaseStage::ValidationFailed
                | PurchaseStage::AccountNotFound
                | PurchaseStage::InsufficientFunds
        )
    }
}

// Taxpayer-style ids arrive as strings or as bare numbers depending on the client.
fn deserialize_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number identifier, found {}",
            other
        ))),
    }
}
