use super::transaction::{NewTransaction, Transaction, TransactionId};
use super::wallet::{Balance, NewWallet, Wallet, WalletId, WalletUpdate};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Durable home of wallets and ledger entries.
///
/// Balance mutations only happen through a [`UnitOfWork`] obtained from [`LedgerStore::begin`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a unit of work holding exclusive locks on `wallets`.
    ///
    /// Implementations acquire the locks in ascending id order so that two units
    /// touching the same pair of wallets can never deadlock.
    async fn begin(&self, wallets: &[WalletId]) -> Result<Box<dyn UnitOfWork>>;

    async fn create_wallet(&self, wallet: NewWallet) -> Result<Wallet>;
    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>>;
    async fn list_wallets(&self, owner: &str) -> Result<Vec<Wallet>>;
    async fn all_wallets(&self) -> Result<Vec<Wallet>>;
    async fn update_wallet(&self, id: WalletId, update: WalletUpdate) -> Result<Option<Wallet>>;
    /// Hard delete. Returns `false` when the wallet did not exist.
    async fn delete_wallet(&self, id: WalletId) -> Result<bool>;
    /// Ledger entries where `wallet` is source or destination, ascending by id.
    async fn transactions_for(&self, wallet: WalletId) -> Result<Vec<Transaction>>;
}

/// An all-or-nothing scope of ledger operations.
///
/// Nothing issued through a unit is visible to other readers until [`UnitOfWork::commit`]
/// succeeds. Dropping a unit that was neither committed nor rolled back discards
/// its staged effects and releases its locks.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn read_balance(&mut self, wallet: WalletId) -> Result<Option<Balance>>;
    /// Applies a signed delta; negative deltas fail if the result would drop below zero.
    async fn apply_delta(&mut self, wallet: WalletId, delta: Decimal) -> Result<Balance>;
    async fn append_transaction(&mut self, record: NewTransaction) -> Result<TransactionId>;
    async fn commit(&mut self) -> Result<()>;
    async fn rollback(&mut self) -> Result<()>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
