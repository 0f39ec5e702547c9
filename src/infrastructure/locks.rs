use crate::domain::wallet::WalletId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SlotMap, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slots = Arc<SlotMap<HashMap<WalletId, Arc<Mutex<()>>>>>;

/// Per-wallet exclusive locks shared by every unit of work of a store.
///
/// A slot only exists while some unit holds or waits for it, so the map stays
/// bounded by the number of in-flight units.
#[derive(Default, Clone)]
pub struct WalletLocks {
    slots: Slots,
}

/// Guards held for the lifetime of a unit of work. Dropping releases them.
pub struct HeldLocks {
    wallets: Vec<WalletId>,
    guards: Vec<OwnedMutexGuard<()>>,
    slots: Slots,
}

impl HeldLocks {
    pub fn covers(&self, wallet: WalletId) -> bool {
        self.wallets.binary_search(&wallet).is_ok()
    }

    pub fn wallets(&self) -> &[WalletId] {
        &self.wallets
    }
}

impl Drop for HeldLocks {
    fn drop(&mut self) {
        self.guards.clear();
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        for wallet in &self.wallets {
            // The map's own reference is the last one: nobody holds or awaits the slot.
            if slots
                .get(wallet)
                .is_some_and(|slot| Arc::strong_count(slot) == 1)
            {
                slots.remove(wallet);
            }
        }
    }
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks every wallet in `wallets`, in ascending id order, skipping duplicates.
    pub async fn acquire(&self, wallets: &[WalletId]) -> HeldLocks {
        let mut ordered = wallets.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        // Clone every slot up front so none can be pruned while earlier locks are awaited.
        let pending: Vec<Arc<Mutex<()>>> = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            ordered
                .iter()
                .map(|wallet| slots.entry(*wallet).or_default().clone())
                .collect()
        };

        let mut held = HeldLocks {
            wallets: ordered,
            guards: Vec::with_capacity(pending.len()),
            slots: Arc::clone(&self.slots),
        };
        for slot in pending {
            held.guards.push(slot.lock_owned().await);
        }
        held
    }

    /// Number of wallets currently held or awaited.
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
