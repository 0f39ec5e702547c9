use crate::domain::wallet::Wallet;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct WalletRow<'a> {
    id: u64,
    owner: &'a str,
    account_number: &'a str,
    balance: Decimal,
}

const HEADER: [&str; 4] = ["id", "owner", "account_number", "balance"];

/// Writes the wallet table as CSV: `id,owner,account_number,balance`, ordered by id.
pub struct WalletWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> WalletWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    pub fn write_wallets(&mut self, mut wallets: Vec<Wallet>) -> Result<()> {
        wallets.sort_by_key(|wallet| wallet.id);
        self.writer.write_record(HEADER)?;
        for wallet in &wallets {
            self.writer.serialize(WalletRow {
                id: wallet.id.0,
                owner: &wallet.owner,
                account_number: &wallet.account_number,
                balance: wallet.balance.value().normalize(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
