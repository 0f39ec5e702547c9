use super::wallet::{Amount, WalletId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned ledger entry identifier.
///
/// Ids are drawn from a sequence when an entry is staged, not when it commits.
/// They are unique and increase in staging order, but units on disjoint wallets
/// may commit out of id order, and a rolled-back unit leaves a gap. Order by
/// `created_at` for commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Transfer,
    Withdraw,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Transfer => "transfer",
            Operation::Withdraw => "withdraw",
        }
    }
}

/// An immutable record of a committed debit/credit event.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub from_wallet: Option<WalletId>,
    /// Always `None` for withdrawals.
    pub to_wallet: Option<WalletId>,
    pub amount: Amount,
    pub operation: Operation,
    /// Commit time, not request time.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn touches(&self, wallet: WalletId) -> bool {
        self.from_wallet == Some(wallet) || self.to_wallet == Some(wallet)
    }
}

/// A ledger entry staged inside a unit of work, not yet committed.
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    pub from_wallet: Option<WalletId>,
    pub to_wallet: Option<WalletId>,
    pub amount: Amount,
    pub operation: Operation,
}

impl NewTransaction {
    pub fn transfer(from: WalletId, to: WalletId, amount: Amount) -> Self {
        Self {
            from_wallet: Some(from),
            to_wallet: Some(to),
            amount,
            operation: Operation::Transfer,
        }
    }

    pub fn withdraw(from: WalletId, amount: Amount) -> Self {
        Self {
            from_wallet: Some(from),
            to_wallet: None,
            amount,
            operation: Operation::Withdraw,
        }
    }

    pub fn into_record(self, id: TransactionId, committed_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            from_wallet: self.from_wallet,
            to_wallet: self.to_wallet,
            amount: self.amount,
            operation: self.operation,
            created_at: committed_at,
        }
    }
}
