use crate::domain::wallet::WalletId;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet {0} not found")]
    WalletNotFound(WalletId),
    #[error("Insufficient funds in wallet {wallet}: available {available}, required {required}")]
    InsufficientFunds {
        wallet: WalletId,
        available: Decimal,
        required: Decimal,
    },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Cannot transfer from wallet {0} to itself")]
    SelfTransfer(WalletId),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Commit failed: {0}")]
    CommitFailed(String),
    #[error("Unit of work exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl WalletError {
    /// Stable label used when reporting failures to metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WalletError::WalletNotFound(_) => "not_found",
            WalletError::InsufficientFunds { .. } => "insufficient_funds",
            WalletError::InvalidAmount(_) => "invalid_amount",
            WalletError::SelfTransfer(_) => "self_transfer",
            WalletError::InvalidCommand(_) => "invalid_command",
            WalletError::CommitFailed(_) => "commit_failed",
            WalletError::DeadlineExceeded(_) => "deadline_exceeded",
            WalletError::CsvError(_) => "csv",
            WalletError::IoError(_) => "io",
            #[cfg(feature = "storage-rocksdb")]
            WalletError::RocksDbError(_) => "storage",
            WalletError::InternalError(_) => "internal",
        }
    }

    /// Business rejections are decided by ledger rules, everything else is infrastructure.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            WalletError::WalletNotFound(_)
                | WalletError::InsufficientFunds { .. }
                | WalletError::InvalidAmount(_)
                | WalletError::SelfTransfer(_)
                | WalletError::InvalidCommand(_)
        )
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        WalletError::InternalError(Box::new(std::io::Error::other(message.into())))
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;
