use super::metrics::EngineMetrics;
use super::unit_of_work::{AtomicOperation, with_atomic_unit};
use crate::config::EngineConfig;
use crate::domain::guard::BalanceGuard;
use crate::domain::ports::{LedgerStoreRef, UnitOfWork};
use crate::domain::transaction::{NewTransaction, TransactionId};
use crate::domain::wallet::{Amount, WalletId};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Executes balance mutations.
///
/// Every transfer or withdrawal runs as one unit of work: guard check, debit,
/// credit (transfers only) and ledger append are committed together, or not at
/// all. Wallet balances are never changed anywhere else.
pub struct TransactionEngine {
    store: LedgerStoreRef,
    metrics: Arc<dyn EngineMetrics>,
    unit_deadline: Duration,
}

impl TransactionEngine {
    /// Creates a new `TransactionEngine`.
    ///
    /// # Arguments
    ///
    /// * `store` - The ledger store holding wallets and transactions.
    /// * `metrics` - Observability collaborator.
    /// * `config` - Engine settings, notably the unit-of-work deadline.
    pub fn new(
        store: LedgerStoreRef,
        metrics: Arc<dyn EngineMetrics>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            metrics,
            unit_deadline: config.unit_deadline,
        }
    }

    /// Moves `amount` from one wallet to another and records a `transfer` entry.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is not strictly positive.
    /// * `SelfTransfer` - `from` and `to` are the same wallet.
    /// * `WalletNotFound` - either wallet is missing.
    /// * `InsufficientFunds` - the source balance is zero or below `amount`.
    /// * `CommitFailed` / `DeadlineExceeded` - infrastructure failure; nothing was applied.
    pub async fn transfer(
        &self,
        from: WalletId,
        to: WalletId,
        amount: Decimal,
    ) -> Result<TransactionId> {
        let started = Instant::now();
        let result = self.try_transfer(from, to, amount).await;
        self.observe("Transfer", started, &result);
        match &result {
            Ok(id) => info!(%from, %to, %amount, transaction = %id, "transfer committed"),
            Err(err) => warn!(%from, %to, %amount, error = %err, "transfer rejected"),
        }
        result
    }

    /// Removes `amount` from a wallet and records a `withdraw` entry with no destination.
    ///
    /// Same error taxonomy as [`TransactionEngine::transfer`], minus `SelfTransfer`.
    pub async fn withdraw(&self, from: WalletId, amount: Decimal) -> Result<TransactionId> {
        let started = Instant::now();
        let result = self.try_withdraw(from, amount).await;
        self.observe("Withdraw", started, &result);
        match &result {
            Ok(id) => info!(%from, %amount, transaction = %id, "withdrawal committed"),
            Err(err) => warn!(%from, %amount, error = %err, "withdrawal rejected"),
        }
        result
    }

    async fn try_transfer(
        &self,
        from: WalletId,
        to: WalletId,
        amount: Decimal,
    ) -> Result<TransactionId> {
        let amount = Amount::new(amount)?;
        if from == to {
            return Err(WalletError::SelfTransfer(from));
        }
        with_atomic_unit(
            self.store.as_ref(),
            &[from, to],
            self.unit_deadline,
            Transfer { from, to, amount },
        )
        .await
    }

    async fn try_withdraw(&self, from: WalletId, amount: Decimal) -> Result<TransactionId> {
        let amount = Amount::new(amount)?;
        with_atomic_unit(
            self.store.as_ref(),
            &[from],
            self.unit_deadline,
            Withdraw { from, amount },
        )
        .await
    }

    fn observe<T>(&self, method: &'static str, started: Instant, result: &Result<T>) {
        self.metrics.record_duration(method, started.elapsed());
        if let Err(err) = result {
            self.metrics.record_error(method, err.kind());
        }
    }
}

struct Transfer {
    from: WalletId,
    to: WalletId,
    amount: Amount,
}

#[async_trait]
impl AtomicOperation for Transfer {
    type Output = TransactionId;

    async fn run(self, unit: &mut dyn UnitOfWork) -> Result<TransactionId> {
        let balance = BalanceGuard::check(unit, self.from, self.amount).await?;
        debug!(wallet = %self.from, %balance, "balance guard passed");

        unit.apply_delta(self.from, -self.amount.value()).await?;
        unit.apply_delta(self.to, self.amount.value()).await?;
        unit.append_transaction(NewTransaction::transfer(self.from, self.to, self.amount))
            .await
    }
}

struct Withdraw {
    from: WalletId,
    amount: Amount,
}

#[async_trait]
impl AtomicOperation for Withdraw {
    type Output = TransactionId;

    async fn run(self, unit: &mut dyn UnitOfWork) -> Result<TransactionId> {
        let balance = BalanceGuard::check(unit, self.from, self.amount).await?;
        debug!(wallet = %self.from, %balance, "balance guard passed");

        unit.apply_delta(self.from, -self.amount.value()).await?;
        unit.append_transaction(NewTransaction::withdraw(self.from, self.amount))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::metrics::NoopMetrics;
    use crate::domain::ports::LedgerStore;
    use crate::domain::transaction::Operation;
    use crate::domain::wallet::{Balance, NewWallet};
    use crate::infrastructure::in_memory::InMemoryLedgerStore;
    use rust_decimal_macros::dec;

    async fn setup() -> (TransactionEngine, Arc<InMemoryLedgerStore>, WalletId, WalletId) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let alice = store
            .create_wallet(NewWallet::new("alice", dec!(100), "ACC1").unwrap())
            .await
            .unwrap()
            .id;
        let bob = store
            .create_wallet(NewWallet::new("bob", dec!(0), "ACC2").unwrap())
            .await
            .unwrap()
            .id;
        let engine = TransactionEngine::new(
            store.clone(),
            Arc::new(NoopMetrics),
            &EngineConfig::default(),
        );
        (engine, store, alice, bob)
    }

    async fn balance(store: &InMemoryLedgerStore, id: WalletId) -> Balance {
        store.get_wallet(id).await.unwrap().unwrap().balance
    }

    #[tokio::test]
    async fn test_transfer_moves_funds_and_records_entry() {
        let (engine, store, alice, bob) = setup().await;

        let id = engine.transfer(alice, bob, dec!(30)).await.unwrap();

        assert_eq!(balance(&store, alice).await, Balance::new(dec!(70)));
        assert_eq!(balance(&store, bob).await, Balance::new(dec!(30)));

        let ledger = store.transactions_for(alice).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].id, id);
        assert_eq!(ledger[0].operation, Operation::Transfer);
        assert_eq!(ledger[0].from_wallet, Some(alice));
        assert_eq!(ledger[0].to_wallet, Some(bob));
        assert_eq!(ledger[0].amount.value(), dec!(30));
    }

    #[tokio::test]
    async fn test_withdraw_leaves_destination_empty() {
        let (engine, store, alice, _bob) = setup().await;

        engine.withdraw(alice, dec!(25)).await.unwrap();

        assert_eq!(balance(&store, alice).await, Balance::new(dec!(75)));
        let ledger = store.transactions_for(alice).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].operation, Operation::Withdraw);
        assert_eq!(ledger[0].to_wallet, None);
    }

    #[tokio::test]
    async fn test_rejections_leave_no_trace() {
        let (engine, store, alice, bob) = setup().await;

        assert!(matches!(
            engine.transfer(alice, bob, dec!(0)).await,
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.withdraw(alice, dec!(-5)).await,
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.transfer(alice, alice, dec!(10)).await,
            Err(WalletError::SelfTransfer(_))
        ));
        assert!(matches!(
            engine.transfer(bob, alice, dec!(1)).await,
            Err(WalletError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            engine.transfer(alice, WalletId(99), dec!(1)).await,
            Err(WalletError::WalletNotFound(WalletId(99)))
        ));
        assert!(matches!(
            engine.withdraw(WalletId(99), dec!(1)).await,
            Err(WalletError::WalletNotFound(WalletId(99)))
        ));

        assert_eq!(balance(&store, alice).await, Balance::new(dec!(100)));
        assert_eq!(balance(&store, bob).await, Balance::ZERO);
        assert!(store.transactions_for(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_credit_is_rejected() {
        let (engine, store, _alice, _bob) = setup().await;
        let rich = store
            .create_wallet(NewWallet::new("rich", Decimal::MAX, "ACC3").unwrap())
            .await
            .unwrap()
            .id;
        let poor = store
            .create_wallet(NewWallet::new("poor", dec!(1), "ACC4").unwrap())
            .await
            .unwrap()
            .id;

        let result = engine.transfer(poor, rich, dec!(1)).await;

        assert!(matches!(result, Err(WalletError::InvalidAmount(_))));
        assert_eq!(balance(&store, rich).await, Balance::new(Decimal::MAX));
        assert_eq!(balance(&store, poor).await, Balance::new(dec!(1)));
        assert!(store.transactions_for(poor).await.unwrap().is_empty());
        assert!(store.transactions_for(rich).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transaction_ids_increase() {
        let (engine, _store, alice, bob) = setup().await;
        let first = engine.transfer(alice, bob, dec!(10)).await.unwrap();
        let second = engine.withdraw(alice, dec!(10)).await.unwrap();
        assert!(second > first);
    }
}
