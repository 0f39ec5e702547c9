use crate::application::service::WalletService;
use crate::domain::transaction::TransactionId;
use crate::domain::wallet::{WalletId, WalletUpdate};
use crate::error::Result;
use rust_decimal::Decimal;
use std::fmt;

/// A validated request against the wallet service.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletCommand {
    Create {
        owner: String,
        initial_balance: Decimal,
        account_number: String,
    },
    Transfer {
        from: WalletId,
        to: WalletId,
        amount: Decimal,
    },
    Withdraw {
        from: WalletId,
        amount: Decimal,
    },
    Update {
        wallet: WalletId,
        update: WalletUpdate,
    },
    Delete {
        wallet: WalletId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Created(WalletId),
    Committed(TransactionId),
    Updated(WalletId),
    Deleted(WalletId),
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Created(id) => write!(f, "created wallet {id}"),
            CommandOutcome::Committed(id) => write!(f, "committed transaction {id}"),
            CommandOutcome::Updated(id) => write!(f, "updated wallet {id}"),
            CommandOutcome::Deleted(id) => write!(f, "deleted wallet {id}"),
        }
    }
}

impl WalletCommand {
    pub async fn execute(self, service: &WalletService) -> Result<CommandOutcome> {
        match self {
            WalletCommand::Create {
                owner,
                initial_balance,
                account_number,
            } => service
                .create_wallet(owner, initial_balance, account_number)
                .await
                .map(CommandOutcome::Created),
            WalletCommand::Transfer { from, to, amount } => service
                .transfer(from, to, amount)
                .await
                .map(CommandOutcome::Committed),
            WalletCommand::Withdraw { from, amount } => service
                .withdraw(from, amount)
                .await
                .map(CommandOutcome::Committed),
            WalletCommand::Update { wallet, update } => service
                .update_wallet(wallet, update)
                .await
                .map(|w| CommandOutcome::Updated(w.id)),
            WalletCommand::Delete { wallet } => service
                .delete_wallet(wallet)
                .await
                .map(|()| CommandOutcome::Deleted(wallet)),
        }
    }
}
