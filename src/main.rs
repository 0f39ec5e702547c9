use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use wallet_ledger::application::metrics::RecorderMetrics;
use wallet_ledger::application::service::WalletService;
use wallet_ledger::config::LedgerConfig;
use wallet_ledger::domain::ports::LedgerStoreRef;
use wallet_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use wallet_ledger::interfaces::csv::command_reader::CommandReader;
use wallet_ledger::interfaces::csv::wallet_writer::WalletWriter;
use wallet_ledger::logging;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input CSV file of wallet commands
    input: PathBuf,

    #[command(flatten)]
    config: LedgerConfig,
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(config: &LedgerConfig) -> Result<LedgerStoreRef> {
    use wallet_ledger::infrastructure::rocksdb::RocksDBLedgerStore;

    match &config.db_path {
        Some(db_path) => {
            let store = RocksDBLedgerStore::open(db_path).into_diagnostic()?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(InMemoryLedgerStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(config: &LedgerConfig) -> Result<LedgerStoreRef> {
    if config.db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Arc::new(InMemoryLedgerStore::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.config.log_filter);

    let store = open_store(&cli.config)?;
    let service = WalletService::new(store, Arc::new(RecorderMetrics), &cli.config.engine());

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(command) => match command.execute(&service).await {
                Ok(outcome) => info!(%outcome, "command applied"),
                Err(e) => eprintln!("Error processing command: {}", e),
            },
            Err(e) => {
                eprintln!("Error reading command: {}", e);
            }
        }
    }

    let wallets = service.all_wallets().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = WalletWriter::new(stdout.lock());
    writer.write_wallets(wallets).into_diagnostic()?;

    Ok(())
}
