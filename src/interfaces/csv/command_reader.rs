use crate::domain::wallet::{WalletId, WalletUpdate};
use crate::error::{Result, WalletError};
use crate::interfaces::command::WalletCommand;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Create,
    Transfer,
    Withdraw,
    Update,
    Delete,
}

/// One raw CSV row: `command, wallet, target, amount, owner, account`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub command: CommandType,
    pub wallet: Option<u64>,
    pub target: Option<u64>,
    pub amount: Option<Decimal>,
    pub owner: Option<String>,
    pub account: Option<String>,
}

impl TryFrom<CommandRecord> for WalletCommand {
    type Error = WalletError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        let wallet = || {
            record
                .wallet
                .map(WalletId)
                .ok_or_else(|| missing("wallet", record.command))
        };
        let amount = || record.amount.ok_or_else(|| missing("amount", record.command));

        Ok(match record.command {
            CommandType::Create => WalletCommand::Create {
                owner: record
                    .owner
                    .clone()
                    .ok_or_else(|| missing("owner", record.command))?,
                initial_balance: record.amount.unwrap_or(Decimal::ZERO),
                account_number: record.account.clone().unwrap_or_default(),
            },
            CommandType::Transfer => WalletCommand::Transfer {
                from: wallet()?,
                to: record
                    .target
                    .map(WalletId)
                    .ok_or_else(|| missing("target", record.command))?,
                amount: amount()?,
            },
            CommandType::Withdraw => WalletCommand::Withdraw {
                from: wallet()?,
                amount: amount()?,
            },
            CommandType::Update => WalletCommand::Update {
                wallet: wallet()?,
                update: WalletUpdate {
                    owner: record.owner.clone(),
                    account_number: record.account.clone(),
                },
            },
            CommandType::Delete => WalletCommand::Delete { wallet: wallet()? },
        })
    }
}

fn missing(field: &str, command: CommandType) -> WalletError {
    WalletError::InvalidCommand(format!("{command:?} requires a {field} column value"))
}

/// Reads wallet commands from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<WalletCommand>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads, deserializes and validates commands.
    pub fn commands(self) -> impl Iterator<Item = Result<WalletCommand>> {
        self.reader.into_deserialize().map(|result| {
            let record: CommandRecord = result.map_err(WalletError::from)?;
            WalletCommand::try_from(record)
        })
    }
}
