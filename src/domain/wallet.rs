use crate::error::{Result, WalletError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned wallet identifier.
///
/// Ordering matters: multi-wallet units of work lock wallets in ascending id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(pub u64);

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for WalletId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Monetary value held by a wallet.
///
/// A thin wrapper around `rust_decimal::Decimal` so balances and amounts can't be
/// mixed up by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub Decimal);

/// Strictly positive monetary amount moved by a transfer or withdrawal.
///
/// Deserialisation goes through [`Amount::new`], so a stored record can never
/// yield a zero or negative amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(WalletError::InvalidAmount(format!(
                "amount must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Adds a signed delta, or `None` if the result leaves the `Decimal` range.
    pub fn checked_add(&self, delta: Decimal) -> Option<Self> {
        self.0.checked_add(delta).map(Self)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named account holding a non-negative balance.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Wallet {
    pub id: WalletId,
    /// Not unique: one owner may hold several wallets.
    pub owner: String,
    pub balance: Balance,
    /// Opaque external identifier.
    pub account_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(id: WalletId, new: NewWallet, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner: new.owner,
            balance: new.initial_balance,
            account_number: new.account_number,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a signed delta to the balance.
    ///
    /// Debits are conditional: a delta that would leave the balance below zero is
    /// rejected and the wallet is left untouched. So is a credit that overflows.
    pub fn apply_delta(&mut self, delta: Decimal) -> Result<Balance> {
        let next = self.balance.checked_add(delta).ok_or_else(|| {
            WalletError::InvalidAmount(format!(
                "balance overflow: wallet {} holds {}, delta {delta}",
                self.id, self.balance
            ))
        })?;
        if delta.is_sign_negative() && next.is_negative() {
            return Err(WalletError::InsufficientFunds {
                wallet: self.id,
                available: self.balance.value(),
                required: -delta,
            });
        }
        self.balance = next;
        Ok(next)
    }

    /// Applies a metadata update. The balance is never touched here.
    pub fn apply_update(&mut self, update: WalletUpdate, now: DateTime<Utc>) {
        if let Some(owner) = update.owner {
            self.owner = owner;
        }
        if let Some(account_number) = update.account_number {
            self.account_number = account_number;
        }
        self.updated_at = now;
    }
}

/// Input for wallet creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWallet {
    pub owner: String,
    pub initial_balance: Balance,
    pub account_number: String,
}

impl NewWallet {
    pub fn new(
        owner: impl Into<String>,
        initial_balance: Decimal,
        account_number: impl Into<String>,
    ) -> Result<Self> {
        if initial_balance.is_sign_negative() && !initial_balance.is_zero() {
            return Err(WalletError::InvalidAmount(format!(
                "initial balance must not be negative, got {initial_balance}"
            )));
        }
        Ok(Self {
            owner: owner.into(),
            initial_balance: Balance::new(initial_balance),
            account_number: account_number.into(),
        })
    }
}

/// Metadata replacement for an existing wallet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletUpdate {
    pub owner: Option<String>,
    pub account_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn wallet(balance: Decimal) -> Wallet {
        let new = NewWallet::new("alice", balance, "ACC1").unwrap();
        Wallet::new(WalletId(1), new, Utc::now())
    }

    #[test]
    fn test_balance_arithmetic() {
        let b1 = Balance::new(dec!(10.0));
        let b2 = Balance::new(dec!(5.0));
        assert_eq!(b1.checked_add(b2.value()), Some(Balance::new(dec!(15.0))));
        assert_eq!(b1.checked_add(dec!(-5.0)), Some(Balance::new(dec!(5.0))));
        assert!(b2.checked_add(dec!(-10.0)).unwrap().is_negative());
        assert!(!Balance::ZERO.is_negative());
        assert_eq!(Balance::new(Decimal::MAX).checked_add(dec!(1)), None);
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(0.01)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_amount_deserialization_validates() {
        let amount: Amount = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(amount.value(), dec!(12.5));
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"12.5\"");

        assert!(serde_json::from_str::<Amount>("\"0\"").is_err());
        assert!(serde_json::from_str::<Amount>("\"-3\"").is_err());
    }

    #[test]
    fn test_new_wallet_rejects_negative_balance() {
        assert!(NewWallet::new("bob", dec!(0), "ACC2").is_ok());
        assert!(matches!(
            NewWallet::new("bob", dec!(-0.5), "ACC2"),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_apply_delta_credit_and_debit() {
        let mut w = wallet(dec!(100));
        assert_eq!(w.apply_delta(dec!(-30)).unwrap(), Balance::new(dec!(70)));
        assert_eq!(w.apply_delta(dec!(5.5)).unwrap(), Balance::new(dec!(75.5)));
        assert_eq!(w.balance, Balance::new(dec!(75.5)));
    }

    #[test]
    fn test_apply_delta_refuses_overdraft() {
        let mut w = wallet(dec!(70));
        let result = w.apply_delta(dec!(-1000));
        assert!(matches!(
            result,
            Err(WalletError::InsufficientFunds { wallet: WalletId(1), .. })
        ));
        assert_eq!(w.balance, Balance::new(dec!(70)));

        // Draining to exactly zero is allowed.
        assert_eq!(w.apply_delta(dec!(-70)).unwrap(), Balance::ZERO);
    }

    #[test]
    fn test_apply_delta_refuses_overflowing_credit() {
        let mut w = wallet(Decimal::MAX);
        let result = w.apply_delta(dec!(1));
        assert!(matches!(result, Err(WalletError::InvalidAmount(_))));
        assert_eq!(w.balance, Balance::new(Decimal::MAX));

        // Crediting up to the limit is still fine.
        let mut w = wallet(Decimal::MAX - dec!(1));
        assert_eq!(w.apply_delta(dec!(1)).unwrap(), Balance::new(Decimal::MAX));
    }

    #[test]
    fn test_apply_update_keeps_balance() {
        let mut w = wallet(dec!(42));
        let later = w.updated_at + chrono::Duration::seconds(1);
        w.apply_update(
            WalletUpdate {
                owner: Some("carol".to_string()),
                account_number: None,
            },
            later,
        );
        assert_eq!(w.owner, "carol");
        assert_eq!(w.account_number, "ACC1");
        assert_eq!(w.balance, Balance::new(dec!(42)));
        assert_eq!(w.updated_at, later);
    }
}
