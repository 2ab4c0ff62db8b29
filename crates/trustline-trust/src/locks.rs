use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{TrustError, TrustResult};

/// One mutex per key, created on first use and dropped when no caller holds
/// or waits for it.
///
/// Holding a key's lock serializes every read-modify-write for that key.
/// Different keys never contend beyond the brief table lookup.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> TrustResult<T>) -> TrustResult<T> {
        let slot = {
            let mut table = self.table()?;
            Arc::clone(table.entry(key.to_string()).or_default())
        };
        let result = match slot.lock() {
            Ok(_guard) => f(),
            Err(e) => Err(TrustError::LockPoisoned(e.to_string())),
        };
        self.release(key, slot)?;
        result
    }

    /// Evict `key` if the table holds the only other reference to `slot`.
    ///
    /// Clones are only taken under the table lock, so the count cannot grow
    /// while it is being checked here.
    fn release(&self, key: &str, slot: Arc<Mutex<()>>) -> TrustResult<()> {
        let mut table = self.table()?;
        if Arc::strong_count(&slot) == 2 {
            table.remove(key);
        }
        Ok(())
    }

    fn table(&self) -> TrustResult<MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>>> {
        self.table
            .lock()
            .map_err(|e| TrustError::LockPoisoned(e.to_string()))
    }

    /// Number of keys currently locked or awaited.
    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
