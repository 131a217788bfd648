use crate::domain::money::{Amount, Balance};
use crate::domain::ports::WalletServiceBox;
use crate::domain::session::Session;
use crate::domain::wallet::{TopUpRequest, WalletTransaction};
use crate::error::{BookingError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// Wallet balance, top-ups and history for the signed-in user.
pub struct WalletManager {
    wallet: WalletServiceBox,
}

impl WalletManager {
    pub fn new(wallet: WalletServiceBox) -> Self {
        Self { wallet }
    }

    /// Fetches the balance and caches it in the session.
    pub async fn refresh_balance(&self, session: &mut Session) -> Result<Balance> {
        let user_id = session.user_id().ok_or(BookingError::Unauthenticated)?;
        let balance = self.wallet.balance(user_id).await?;
        session.set_balance(balance);
        Ok(balance)
    }

    /// Tops up the wallet. The amount is validated before anything is sent.
    pub async fn top_up(&self, session: &mut Session, amount: Decimal) -> Result<Balance> {
        let amount = Amount::new(amount)
            .map_err(|_| BookingError::ValidationError("Please enter a valid amount".to_string()))?;
        let user_id = session.user_id().ok_or(BookingError::Unauthenticated)?;

        let request = TopUpRequest {
            user_id: user_id.to_string(),
            amount: amount.value(),
            reference: format!("topup-{}", Utc::now().timestamp_millis()),
            description: "Wallet top-up".to_string(),
        };

        let receipt = self.wallet.top_up(&request).await?;
        if !receipt.success {
            return Err(BookingError::ServiceError {
                status: 200,
                message: receipt.failure_message(),
            });
        }

        info!(reference = %request.reference, amount = %amount, "wallet topped up");
        session.credit(amount.into());
        Ok(session.balance.unwrap_or_default())
    }

    pub async fn recent_transactions(
        &self,
        session: &Session,
        limit: u32,
    ) -> Result<Vec<WalletTransaction>> {
        let user_id = session.user_id().ok_or(BookingError::Unauthenticated)?;
        self.wallet.transactions(user_id, limit).await
    }
}
