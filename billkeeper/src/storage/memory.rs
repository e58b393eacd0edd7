//! In-process snapshot slot
//!
//! Clones share one slot, so a test can hand one clone to the store and
//! inspect what was written through the other.

use super::{decode, encode, SnapshotStorage};
use crate::error::{AppError, Result};
use crate::store::Snapshot;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
    saves: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with `snapshot`
    pub fn with_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let storage = Self::new();
        *storage.lock()? = Some(encode(snapshot)?);
        Ok(storage)
    }

    /// Raw persisted envelope, if any
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail, simulating an unavailable device store
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.slot
            .lock()
            .map_err(|_| AppError::Persistence("Memory slot poisoned".to_string()))
    }
}

impl SnapshotStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<Snapshot>> {
        let raw = self.lock()?.clone();
        raw.as_deref().map(decode).transpose()
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("Storage unavailable".to_string()));
        }

        let raw = encode(snapshot)?;
        *self.lock()? = Some(raw);
        self.saves.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}
