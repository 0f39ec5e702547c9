#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use wallet_ledger::application::metrics::{EngineMetrics, NoopMetrics};
use wallet_ledger::application::service::WalletService;
use wallet_ledger::config::EngineConfig;
use wallet_ledger::domain::ports::{LedgerStore, LedgerStoreRef, UnitOfWork};
use wallet_ledger::domain::transaction::{NewTransaction, Transaction, TransactionId};
use wallet_ledger::domain::wallet::{Balance, NewWallet, Wallet, WalletId, WalletUpdate};
use wallet_ledger::error::{Result, WalletError};
use wallet_ledger::infrastructure::in_memory::InMemoryLedgerStore;

pub fn service_over(store: LedgerStoreRef) -> WalletService {
    WalletService::new(store, Arc::new(NoopMetrics), &EngineConfig::default())
}

pub fn in_memory_service() -> WalletService {
    service_over(Arc::new(InMemoryLedgerStore::new()))
}

/// Writes a command script with the standard header followed by `rows`.
pub fn write_script(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "command, wallet, target, amount, owner, account").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// Records every error reported by the engine.
#[derive(Default)]
pub struct CountingMetrics {
    pub errors: Mutex<Vec<(&'static str, &'static str)>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl EngineMetrics for CountingMetrics {
    fn record_duration(&self, method: &'static str, _elapsed: Duration) {
        self.calls.lock().unwrap().push(method);
    }

    fn record_error(&self, method: &'static str, kind: &'static str) {
        self.errors.lock().unwrap().push((method, kind));
    }
}

/// How a [`FaultyStore`] unit misbehaves.
#[derive(Clone, Copy)]
pub enum Fault {
    /// `commit` reports failure and applies nothing.
    FailCommit,
    /// Every balance read stalls for the given duration.
    SlowReads(Duration),
}

/// Wraps an in-memory store and injects infrastructure faults into its units.
#[derive(Clone)]
pub struct FaultyStore {
    pub inner: InMemoryLedgerStore,
    fault: Fault,
}

impl FaultyStore {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: InMemoryLedgerStore::new(),
            fault,
        }
    }
}

#[async_trait]
impl LedgerStore for FaultyStore {
    async fn begin(&self, wallets: &[WalletId]) -> Result<Box<dyn UnitOfWork>> {
        let inner = self.inner.begin(wallets).await?;
        Ok(Box::new(FaultyUnit {
            inner,
            fault: self.fault,
        }))
    }

    async fn create_wallet(&self, wallet: NewWallet) -> Result<Wallet> {
        self.inner.create_wallet(wallet).await
    }

    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>> {
        self.inner.get_wallet(id).await
    }

    async fn list_wallets(&self, owner: &str) -> Result<Vec<Wallet>> {
        self.inner.list_wallets(owner).await
    }

    async fn all_wallets(&self) -> Result<Vec<Wallet>> {
        self.inner.all_wallets().await
    }

    async fn update_wallet(&self, id: WalletId, update: WalletUpdate) -> Result<Option<Wallet>> {
        self.inner.update_wallet(id, update).await
    }

    async fn delete_wallet(&self, id: WalletId) -> Result<bool> {
        self.inner.delete_wallet(id).await
    }

    async fn transactions_for(&self, wallet: WalletId) -> Result<Vec<Transaction>> {
        self.inner.transactions_for(wallet).await
    }
}

struct FaultyUnit {
    inner: Box<dyn UnitOfWork>,
    fault: Fault,
}

#[async_trait]
impl UnitOfWork for FaultyUnit {
    async fn read_balance(&mut self, wallet: WalletId) -> Result<Option<Balance>> {
        if let Fault::SlowReads(delay) = self.fault {
            tokio::time::sleep(delay).await;
        }
        self.inner.read_balance(wallet).await
    }

    async fn apply_delta(&mut self, wallet: WalletId, delta: Decimal) -> Result<Balance> {
        self.inner.apply_delta(wallet, delta).await
    }

    async fn append_transaction(&mut self, record: NewTransaction) -> Result<TransactionId> {
        self.inner.append_transaction(record).await
    }

    async fn commit(&mut self) -> Result<()> {
        match self.fault {
            Fault::FailCommit => {
                self.inner.rollback().await?;
                Err(WalletError::CommitFailed("connection lost".to_string()))
            }
            Fault::SlowReads(_) => self.inner.commit().await,
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        self.inner.rollback().await
    }
}
