use super::locks::{HeldLocks, WalletLocks};
use crate::domain::ports::{LedgerStore, UnitOfWork};
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId};
use crate::domain::wallet::{Balance, NewWallet, Wallet, WalletId, WalletUpdate};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct LedgerState {
    wallets: BTreeMap<WalletId, Wallet>,
    transactions: BTreeMap<TransactionId, Transaction>,
    last_wallet_id: u64,
}

/// A thread-safe in-memory ledger store.
///
/// Wallets and ledger entries live behind one `Arc<RwLock<..>>`; per-wallet locks
/// serialise units of work, and a commit publishes all of a unit's staged
/// effects under a single write guard. Ideal for testing and for short-lived
/// batch runs where persistence is not required.
#[derive(Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
    locks: WalletLocks,
    next_transaction_id: Arc<AtomicU64>,
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
            locks: WalletLocks::new(),
            next_transaction_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self, wallets: &[WalletId]) -> Result<Box<dyn UnitOfWork>> {
        let locks = self.locks.acquire(wallets).await;
        Ok(Box::new(InMemoryUnit {
            state: Arc::clone(&self.state),
            sequence: Arc::clone(&self.next_transaction_id),
            locks,
            staged_wallets: BTreeMap::new(),
            staged_entries: Vec::new(),
            finished: false,
        }))
    }

    async fn create_wallet(&self, wallet: NewWallet) -> Result<Wallet> {
        let mut state = self.state.write().await;
        state.last_wallet_id += 1;
        let wallet = Wallet::new(WalletId(state.last_wallet_id), wallet, Utc::now());
        state.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>> {
        let state = self.state.read().await;
        Ok(state.wallets.get(&id).cloned())
    }

    async fn list_wallets(&self, owner: &str) -> Result<Vec<Wallet>> {
        let state = self.state.read().await;
        Ok(state
            .wallets
            .values()
            .filter(|wallet| wallet.owner == owner)
            .cloned()
            .collect())
    }

    async fn all_wallets(&self) -> Result<Vec<Wallet>> {
        let state = self.state.read().await;
        Ok(state.wallets.values().cloned().collect())
    }

    async fn update_wallet(&self, id: WalletId, update: WalletUpdate) -> Result<Option<Wallet>> {
        let _held = self.locks.acquire(&[id]).await;
        let mut state = self.state.write().await;
        Ok(state.wallets.get_mut(&id).map(|wallet| {
            wallet.apply_update(update, Utc::now());
            wallet.clone()
        }))
    }

    async fn delete_wallet(&self, id: WalletId) -> Result<bool> {
        let _held = self.locks.acquire(&[id]).await;
        let mut state = self.state.write().await;
        Ok(state.wallets.remove(&id).is_some())
    }

    async fn transactions_for(&self, wallet: WalletId) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .values()
            .filter(|tx| tx.touches(wallet))
            .cloned()
            .collect())
    }
}

/// Unit of work over [`InMemoryLedgerStore`].
///
/// Mutations are staged locally and only published on commit.
struct InMemoryUnit {
    state: Arc<RwLock<LedgerState>>,
    sequence: Arc<AtomicU64>,
    locks: HeldLocks,
    staged_wallets: BTreeMap<WalletId, Wallet>,
    staged_entries: Vec<(TransactionId, NewTransaction)>,
    finished: bool,
}

impl InMemoryUnit {
    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(WalletError::internal("unit of work already finished"));
        }
        Ok(())
    }

    async fn current(&self, wallet: WalletId) -> Option<Wallet> {
        if let Some(staged) = self.staged_wallets.get(&wallet) {
            return Some(staged.clone());
        }
        self.state.read().await.wallets.get(&wallet).cloned()
    }

    fn discard(&mut self) {
        self.staged_wallets.clear();
        self.staged_entries.clear();
        self.finished = true;
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnit {
    async fn read_balance(&mut self, wallet: WalletId) -> Result<Option<Balance>> {
        self.ensure_open()?;
        Ok(self.current(wallet).await.map(|w| w.balance))
    }

    async fn apply_delta(&mut self, wallet: WalletId, delta: Decimal) -> Result<Balance> {
        self.ensure_open()?;
        if !self.locks.covers(wallet) {
            return Err(WalletError::internal(format!(
                "wallet {wallet} is not locked by this unit of work"
            )));
        }
        let mut current = self
            .current(wallet)
            .await
            .ok_or(WalletError::WalletNotFound(wallet))?;
        let balance = current.apply_delta(delta)?;
        self.staged_wallets.insert(wallet, current);
        Ok(balance)
    }

    async fn append_transaction(&mut self, record: NewTransaction) -> Result<TransactionId> {
        self.ensure_open()?;
        let id = TransactionId(self.sequence.fetch_add(1, Ordering::SeqCst));
        self.staged_entries.push((id, record));
        Ok(id)
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.state.write().await;

        if let Some(missing) = self
            .staged_wallets
            .keys()
            .find(|id| !state.wallets.contains_key(*id))
            .copied()
        {
            drop(state);
            self.discard();
            return Err(WalletError::CommitFailed(format!(
                "wallet {missing} disappeared before commit"
            )));
        }

        let now = Utc::now();
        for (id, mut wallet) in std::mem::take(&mut self.staged_wallets) {
            wallet.updated_at = now;
            state.wallets.insert(id, wallet);
        }
        for (id, record) in std::mem::take(&mut self.staged_entries) {
            state.transactions.insert(id, record.into_record(id, now));
        }
        self.finished = true;
        debug!(wallets = ?self.locks.wallets(), "unit of work committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.discard();
        debug!(wallets = ?self.locks.wallets(), "unit of work rolled back");
        Ok(())
    }
}

impl Drop for InMemoryUnit {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                wallets = ?self.locks.wallets(),
                staged = self.staged_wallets.len(),
                "unit of work dropped unfinished, discarding staged changes"
            );
        }
    }
}
