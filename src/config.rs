//! Runtime configuration.
//!
//! Every setting can come from the command line or from the environment; the
//! command line wins.

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Default bound on a single unit of work.
pub const DEFAULT_UNIT_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Args, Debug, Clone)]
pub struct LedgerConfig {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "LEDGER_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Deadline for a single transfer or withdrawal, in milliseconds.
    #[arg(long, env = "LEDGER_UNIT_DEADLINE_MS", default_value_t = 5_000)]
    pub unit_deadline_ms: u64,

    /// Tracing filter directives, e.g. `info,wallet_ledger=debug`.
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_filter: String,
}

impl LedgerConfig {
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            unit_deadline: Duration::from_millis(self.unit_deadline_ms),
        }
    }
}

/// Settings consumed by the transaction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on one unit of work, lock acquisition included.
    pub unit_deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unit_deadline: DEFAULT_UNIT_DEADLINE,
        }
    }
}
