use super::engine::TransactionEngine;
use super::metrics::EngineMetrics;
use crate::config::EngineConfig;
use crate::domain::ports::LedgerStoreRef;
use crate::domain::transaction::{Transaction, TransactionId};
use crate::domain::wallet::{Balance, NewWallet, Wallet, WalletId, WalletUpdate};
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Entry point for callers outside the crate.
///
/// Wallet lifecycle calls go straight to the store; balance mutations go through
/// the [`TransactionEngine`]. Cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub struct WalletService {
    store: LedgerStoreRef,
    engine: Arc<TransactionEngine>,
    metrics: Arc<dyn EngineMetrics>,
}

impl WalletService {
    pub fn new(
        store: LedgerStoreRef,
        metrics: Arc<dyn EngineMetrics>,
        config: &EngineConfig,
    ) -> Self {
        let engine = TransactionEngine::new(Arc::clone(&store), Arc::clone(&metrics), config);
        Self {
            store,
            engine: Arc::new(engine),
            metrics,
        }
    }

    pub async fn create_wallet(
        &self,
        owner: impl Into<String>,
        initial_balance: Decimal,
        account_number: impl Into<String>,
    ) -> Result<WalletId> {
        let new = NewWallet::new(owner, initial_balance, account_number)?;
        let wallet = self
            .timed("CreateWallet", self.store.create_wallet(new))
            .await?;
        info!(wallet = %wallet.id, owner = %wallet.owner, "wallet created");
        Ok(wallet.id)
    }

    pub async fn get_wallet(&self, id: WalletId) -> Result<Wallet> {
        self.timed("GetWallet", self.store.get_wallet(id))
            .await?
            .ok_or(WalletError::WalletNotFound(id))
    }

    pub async fn list_wallets(&self, owner: &str) -> Result<Vec<Wallet>> {
        self.timed("GetAllWallets", self.store.list_wallets(owner))
            .await
    }

    pub async fn all_wallets(&self) -> Result<Vec<Wallet>> {
        self.store.all_wallets().await
    }

    /// Replaces wallet metadata. Balances can only change through transfers and withdrawals.
    pub async fn update_wallet(&self, id: WalletId, update: WalletUpdate) -> Result<Wallet> {
        self.timed("UpdateWallet", self.store.update_wallet(id, update))
            .await?
            .ok_or(WalletError::WalletNotFound(id))
    }

    pub async fn delete_wallet(&self, id: WalletId) -> Result<()> {
        if self.timed("DeleteWallet", self.store.delete_wallet(id)).await? {
            info!(wallet = %id, "wallet deleted");
            Ok(())
        } else {
            Err(WalletError::WalletNotFound(id))
        }
    }

    pub async fn check_balance(&self, id: WalletId) -> Result<Balance> {
        Ok(self.get_wallet(id).await?.balance)
    }

    /// Ledger history of a wallet, oldest first.
    pub async fn wallet_transactions(&self, id: WalletId) -> Result<Vec<Transaction>> {
        self.timed("ListTransactions", self.store.transactions_for(id))
            .await
    }

    pub async fn transfer(
        &self,
        from: WalletId,
        to: WalletId,
        amount: Decimal,
    ) -> Result<TransactionId> {
        self.engine.transfer(from, to, amount).await
    }

    pub async fn withdraw(&self, from: WalletId, amount: Decimal) -> Result<TransactionId> {
        self.engine.withdraw(from, amount).await
    }

    async fn timed<T>(
        &self,
        method: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let started = Instant::now();
        let result = call.await;
        self.metrics.record_duration(method, started.elapsed());
        if let Err(err) = &result {
            self.metrics.record_error(method, err.kind());
        }
        result
    }
}
