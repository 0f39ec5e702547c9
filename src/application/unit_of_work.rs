use crate::domain::ports::{LedgerStore, UnitOfWork};
use crate::domain::wallet::WalletId;
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, warn};

/// A sequence of ledger operations that must take effect all together or not at all.
#[async_trait]
pub trait AtomicOperation: Send {
    type Output: Send;

    async fn run(self, unit: &mut dyn UnitOfWork) -> Result<Self::Output>;
}

/// Runs `operation` inside one unit of work locking `wallets`.
///
/// Commits on success and rolls back on any error. The whole scope, lock
/// acquisition included, is bounded by `deadline`; on expiry the in-flight unit
/// is dropped, which discards everything it staged.
pub async fn with_atomic_unit<O: AtomicOperation>(
    store: &dyn LedgerStore,
    wallets: &[WalletId],
    deadline: Duration,
    operation: O,
) -> Result<O::Output> {
    match tokio::time::timeout(deadline, run_in_unit(store, wallets, operation)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(?wallets, ?deadline, "unit of work deadline exceeded, rolled back");
            Err(WalletError::DeadlineExceeded(deadline))
        }
    }
}

async fn run_in_unit<O: AtomicOperation>(
    store: &dyn LedgerStore,
    wallets: &[WalletId],
    operation: O,
) -> Result<O::Output> {
    let mut unit = store.begin(wallets).await?;

    match operation.run(&mut *unit).await {
        Ok(output) => {
            unit.commit().await?;
            Ok(output)
        }
        Err(err) => {
            if let Err(rollback_err) = unit.rollback().await {
                error!(
                    error = %rollback_err,
                    original = %err,
                    "failed to roll back unit of work"
                );
            }
            Err(err)
        }
    }
}
