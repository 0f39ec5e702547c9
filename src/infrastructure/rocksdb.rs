use super::locks::{HeldLocks, WalletLocks};
use crate::domain::ports::{LedgerStore, UnitOfWork};
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId};
use crate::domain::wallet::{Balance, NewWallet, Wallet, WalletId, WalletUpdate};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Column Family for storing wallet records.
pub const CF_WALLETS: &str = "wallets";
/// Column Family for storing ledger entries.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for store bookkeeping (id sequences).
pub const CF_META: &str = "meta";

const LAST_WALLET_ID: &[u8] = b"last_wallet_id";

/// A persistent ledger store implementation using RocksDB.
///
/// Wallets and ledger entries live in separate Column Families keyed by
/// big-endian ids, so iteration yields them in id order. A unit of work stages
/// its writes and commits them as one `WriteBatch`, which RocksDB applies
/// atomically.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBLedgerStore {
    db: Arc<DB>,
    locks: WalletLocks,
    next_transaction_id: Arc<AtomicU64>,
    last_wallet_id: Arc<Mutex<u64>>,
}

impl RocksDBLedgerStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures the required column families exist and recovers the id sequences
    /// from what is already stored.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_WALLETS, CF_TRANSACTIONS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        // Ledger entries are never deleted, so the highest stored key is the
        // high-water mark of the transaction sequence.
        let last_transaction_id = last_key(&db, CF_TRANSACTIONS)?.unwrap_or(0);
        let last_wallet_id = match db.get_cf(column(&db, CF_META)?, LAST_WALLET_ID)? {
            Some(bytes) => decode_id(&bytes)?,
            None => 0,
        };
        info!(
            last_wallet_id,
            last_transaction_id, "opened RocksDB ledger store"
        );

        Ok(Self {
            db: Arc::new(db),
            locks: WalletLocks::new(),
            next_transaction_id: Arc::new(AtomicU64::new(last_transaction_id + 1)),
            last_wallet_id: Arc::new(Mutex::new(last_wallet_id)),
        })
    }

    fn read_wallet(&self, id: WalletId) -> Result<Option<Wallet>> {
        read_wallet(&self.db, id)
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = column(&self.db, cf_name)?;
        let mut items = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            items.push(decode(&value)?);
        }
        Ok(items)
    }
}

#[async_trait]
impl LedgerStore for RocksDBLedgerStore {
    async fn begin(&self, wallets: &[WalletId]) -> Result<Box<dyn UnitOfWork>> {
        let locks = self.locks.acquire(wallets).await;
        Ok(Box::new(RocksDBUnit {
            db: Arc::clone(&self.db),
            sequence: Arc::clone(&self.next_transaction_id),
            locks,
            staged_wallets: BTreeMap::new(),
            staged_entries: Vec::new(),
            finished: false,
        }))
    }

    async fn create_wallet(&self, wallet: NewWallet) -> Result<Wallet> {
        let mut last_wallet_id = self.last_wallet_id.lock().await;
        let id = WalletId(*last_wallet_id + 1);
        let wallet = Wallet::new(id, wallet, Utc::now());

        let mut batch = WriteBatch::default();
        batch.put_cf(column(&self.db, CF_WALLETS)?, id.0.to_be_bytes(), encode(&wallet)?);
        batch.put_cf(column(&self.db, CF_META)?, LAST_WALLET_ID, id.0.to_be_bytes());
        self.db.write(&batch)?;

        *last_wallet_id = id.0;
        Ok(wallet)
    }

    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>> {
        self.read_wallet(id)
    }

    async fn list_wallets(&self, owner: &str) -> Result<Vec<Wallet>> {
        let wallets: Vec<Wallet> = self.scan(CF_WALLETS)?;
        Ok(wallets
            .into_iter()
            .filter(|wallet| wallet.owner == owner)
            .collect())
    }

    async fn all_wallets(&self) -> Result<Vec<Wallet>> {
        self.scan(CF_WALLETS)
    }

    async fn update_wallet(&self, id: WalletId, update: WalletUpdate) -> Result<Option<Wallet>> {
        let _held = self.locks.acquire(&[id]).await;
        let Some(mut wallet) = self.read_wallet(id)? else {
            return Ok(None);
        };
        wallet.apply_update(update, Utc::now());
        self.db
            .put_cf(column(&self.db, CF_WALLETS)?, id.0.to_be_bytes(), encode(&wallet)?)?;
        Ok(Some(wallet))
    }

    async fn delete_wallet(&self, id: WalletId) -> Result<bool> {
        let _held = self.locks.acquire(&[id]).await;
        let cf = column(&self.db, CF_WALLETS)?;
        let key = id.0.to_be_bytes();
        if self.db.get_pinned_cf(cf, key)?.is_none() {
            return Ok(false);
        }
        self.db.delete_cf(cf, key)?;
        Ok(true)
    }

    async fn transactions_for(&self, wallet: WalletId) -> Result<Vec<Transaction>> {
        let transactions: Vec<Transaction> = self.scan(CF_TRANSACTIONS)?;
        Ok(transactions
            .into_iter()
            .filter(|tx| tx.touches(wallet))
            .collect())
    }
}

/// Unit of work over [`RocksDBLedgerStore`], committed as a single `WriteBatch`.
struct RocksDBUnit {
    db: Arc<DB>,
    sequence: Arc<AtomicU64>,
    locks: HeldLocks,
    staged_wallets: BTreeMap<WalletId, Wallet>,
    staged_entries: Vec<(TransactionId, NewTransaction)>,
    finished: bool,
}

impl RocksDBUnit {
    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(WalletError::internal("unit of work already finished"));
        }
        Ok(())
    }

    fn current(&self, wallet: WalletId) -> Result<Option<Wallet>> {
        match self.staged_wallets.get(&wallet) {
            Some(staged) => Ok(Some(staged.clone())),
            None => read_wallet(&self.db, wallet),
        }
    }

    fn discard(&mut self) {
        self.staged_wallets.clear();
        self.staged_entries.clear();
        self.finished = true;
    }

    fn write_staged(&mut self) -> Result<()> {
        let wallets_cf = column(&self.db, CF_WALLETS)?;
        let transactions_cf = column(&self.db, CF_TRANSACTIONS)?;

        for id in self.staged_wallets.keys() {
            if self.db.get_pinned_cf(wallets_cf, id.0.to_be_bytes())?.is_none() {
                return Err(WalletError::CommitFailed(format!(
                    "wallet {id} disappeared before commit"
                )));
            }
        }

        let now = Utc::now();
        let mut batch = WriteBatch::default();
        for (id, wallet) in self.staged_wallets.iter_mut() {
            wallet.updated_at = now;
            batch.put_cf(wallets_cf, id.0.to_be_bytes(), encode(&*wallet)?);
        }
        for (id, record) in std::mem::take(&mut self.staged_entries) {
            let entry = record.into_record(id, now);
            batch.put_cf(transactions_cf, id.0.to_be_bytes(), encode(&entry)?);
        }

        self.db
            .write(&batch)
            .map_err(|e| WalletError::CommitFailed(e.to_string()))
    }
}

#[async_trait]
impl UnitOfWork for RocksDBUnit {
    async fn read_balance(&mut self, wallet: WalletId) -> Result<Option<Balance>> {
        self.ensure_open()?;
        Ok(self.current(wallet)?.map(|w| w.balance))
    }

    async fn apply_delta(&mut self, wallet: WalletId, delta: Decimal) -> Result<Balance> {
        self.ensure_open()?;
        if !self.locks.covers(wallet) {
            return Err(WalletError::internal(format!(
                "wallet {wallet} is not locked by this unit of work"
            )));
        }
        let mut current = self
            .current(wallet)?
            .ok_or(WalletError::WalletNotFound(wallet))?;
        let balance = current.apply_delta(delta)?;
        self.staged_wallets.insert(wallet, current);
        Ok(balance)
    }

    async fn append_transaction(&mut self, record: NewTransaction) -> Result<TransactionId> {
        self.ensure_open()?;
        let id = TransactionId(self.sequence.fetch_add(1, Ordering::SeqCst));
        self.staged_entries.push((id, record));
        Ok(id)
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        let result = self.write_staged();
        self.discard();
        if result.is_ok() {
            debug!(wallets = ?self.locks.wallets(), "unit of work committed");
        }
        result
    }

    async fn rollback(&mut self) -> Result<()> {
        self.discard();
        debug!(wallets = ?self.locks.wallets(), "unit of work rolled back");
        Ok(())
    }
}

fn column<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily> {
    db.cf_handle(name)
        .ok_or_else(|| WalletError::internal(format!("{name} column family not found")))
}

fn read_wallet(db: &DB, id: WalletId) -> Result<Option<Wallet>> {
    let cf = column(db, CF_WALLETS)?;
    match db.get_cf(cf, id.0.to_be_bytes())? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

fn last_key(db: &DB, cf_name: &str) -> Result<Option<u64>> {
    let cf = column(db, cf_name)?;
    match db.iterator_cf(cf, IteratorMode::End).next() {
        Some(item) => {
            let (key, _value) = item?;
            Ok(Some(decode_id(&key)?))
        }
        None => Ok(None),
    }
}

fn decode_id(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| WalletError::internal(format!("malformed id of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| WalletError::InternalError(Box::new(e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| WalletError::InternalError(Box::new(e)))
}
