use super::{ApiClient, DataEnvelope};
use crate::domain::money::Balance;
use crate::domain::ports::WalletService;
use crate::domain::wallet::{TopUpReceipt, TopUpRequest, WalletTransaction};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BalanceData {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    balance: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    #[serde(default)]
    transactions: Vec<WalletTransaction>,
}

pub struct HttpWalletService {
    client: ApiClient,
}

impl HttpWalletService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WalletService for HttpWalletService {
    /// A wallet that reports no balance is treated as empty.
    async fn balance(&self, user_id: &str) -> Result<Balance> {
        let envelope: DataEnvelope<BalanceData> = self
            .client
            .get(&format!("/wallet/balance/{user_id}"), &[])
            .await?;
        let balance = envelope
            .data
            .and_then(|d| d.balance)
            .unwrap_or(Decimal::ZERO);
        Ok(Balance::new(balance))
    }

    async fn top_up(&self, request: &TopUpRequest) -> Result<TopUpReceipt> {
        self.client.post("/wallet/topup", request).await
    }

    async fn transactions(&self, user_id: &str, limit: u32) -> Result<Vec<WalletTransaction>> {
        let envelope: DataEnvelope<TransactionsData> = self
            .client
            .get(
                &format!("/wallet/transactions/{user_id}"),
                &[("limit", limit.to_string())],
            )
            .await?;
        Ok(envelope.data.map(|d| d.transactions).unwrap_or_default())
    }
}
