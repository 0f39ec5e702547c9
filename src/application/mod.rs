//! Application layer containing the core business logic orchestration.
//!
//! `TransactionEngine` owns the atomic transfer/withdraw protocol, built on the
//! `with_atomic_unit` scope. `WalletService` is the thin facade handed to the
//! outside world.

pub mod engine;
pub mod metrics;
pub mod service;
pub mod unit_of_work;
