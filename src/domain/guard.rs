use super::ports::UnitOfWork;
use super::wallet::{Amount, Balance, WalletId};
use crate::error::{Result, WalletError};

/// Pre-flight sufficiency check run before any debit.
pub struct BalanceGuard;

impl BalanceGuard {
    /// Checks a balance snapshot against the requested amount.
    ///
    /// A zero balance is the degenerate case of insufficient funds.
    pub fn check_sufficiency(
        wallet: WalletId,
        balance: Option<Balance>,
        amount: Amount,
    ) -> Result<Balance> {
        let balance = balance.ok_or(WalletError::WalletNotFound(wallet))?;
        if balance.value().is_zero() || balance < Balance::from(amount) {
            return Err(WalletError::InsufficientFunds {
                wallet,
                available: balance.value(),
                required: amount.value(),
            });
        }
        Ok(balance)
    }

    /// Reads the balance through `unit` and checks it.
    ///
    /// The unit must hold the wallet's lock for the snapshot to stay valid until
    /// the debit.
    pub async fn check(
        unit: &mut dyn UnitOfWork,
        wallet: WalletId,
        amount: Amount,
    ) -> Result<Balance> {
        let balance = unit.read_balance(wallet).await?;
        Self::check_sufficiency(wallet, balance, amount)
    }
}
