use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletTransactionType {
    Topup,
    Debit,
    Refund,
    #[serde(other)]
    Other,
}

impl fmt::Display for WalletTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WalletTransactionType::Topup => "TOPUP",
            WalletTransactionType::Debit => "DEBIT",
            WalletTransactionType::Refund => "REFUND",
            WalletTransactionType::Other => "OTHER",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WalletTransactionType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub reference: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopUpError {
    #[serde(default)]
    pub message: Option<String>,
}

/// Wallet service answer to a top-up. `success: false` carries the reason.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopUpReceipt {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<TopUpError>,
}

impl TopUpReceipt {
    pub fn failure_message(&self) -> String {
        self.error
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| "Top-up failed".to_string())
    }
}
