use crate::domain::money::Balance;
use crate::domain::wallet::WalletTransaction;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct TransactionRow<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: String,
    amount: String,
    description: &'a str,
    created_at: &'a str,
}

/// Writes wallet balances and transaction history as CSV.
pub struct WalletWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> WalletWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_balance(&mut self, user_id: &str, balance: Balance) -> Result<()> {
        self.writer.write_record(["user", "balance"])?;
        self.writer
            .write_record([user_id, format!("{:.2}", balance.0).as_str()])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_transactions(&mut self, transactions: &[WalletTransaction]) -> Result<()> {
        for tx in transactions {
            self.writer.serialize(TransactionRow {
                id: &tx.id,
                kind: tx.kind.to_string(),
                amount: format!("{:.2}", tx.amount),
                description: tx.description.as_deref().unwrap_or(""),
                created_at: tx.created_at.as_deref().unwrap_or(""),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
