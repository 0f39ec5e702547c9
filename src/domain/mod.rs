//! Domain layer: the canonical wallet and ledger model, the balance guard, and
//! the store ports the application layer is written against.

pub mod guard;
pub mod ports;
pub mod transaction;
pub mod wallet;
