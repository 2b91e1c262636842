//! Per-account mutual exclusion.
//!
//! Every mutating operation holds the lock of each account it touches for
//! the whole read-validate-write sequence. Locks are always taken in
//! ascending [`AccountId`] order, so two transfers over the same pair can
//! never wait on each other in a cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bank_types::AccountId;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use tracing::{trace, warn};

use crate::error::{LedgerError, LedgerResult};

/// Lock table keyed by account id.
pub struct AccountLocks {
    table: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
    timeout: Duration,
}

/// Guards for a set of accounts. Released on drop.
pub struct LockSet {
    ids: Vec<AccountId>,
    _guards: Vec<ArcMutexGuard<RawMutex, ()>>,
}

impl LockSet {
    /// Locked ids in acquisition order.
    pub fn ids(&self) -> &[AccountId] {
        &self.ids
    }

    pub fn holds(&self, id: AccountId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }
}

impl AccountLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn slot(&self, id: AccountId) -> Arc<Mutex<()>> {
        self.table.lock().entry(id).or_default().clone()
    }

    /// Lock every id in `ids`, deduplicated, in ascending order.
    ///
    /// Fails with [`LedgerError::Busy`] naming the first account whose lock
    /// was not obtained within the timeout. Locks already taken are released
    /// before returning.
    pub fn acquire(&self, ids: &[AccountId]) -> LedgerResult<LockSet> {
        let mut ordered = ids.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for &id in &ordered {
            match self.slot(id).try_lock_arc_for(self.timeout) {
                Some(guard) => guards.push(guard),
                None => {
                    warn!(account = %id, timeout_ms = self.timeout.as_millis() as u64, "account lock timed out");
                    return Err(LedgerError::Busy(id));
                }
            }
        }

        trace!(accounts = ?ordered, "account locks acquired");
        Ok(LockSet {
            ids: ordered,
            _guards: guards,
        })
    }

    /// Drop the lock slot of an account that no longer exists.
    ///
    /// A holder keeps its own reference, so this never invalidates a live
    /// guard. A later `acquire` for the same id creates a fresh mutex that
    /// does not exclude threads still waiting on the old one. Only call
    /// this for deleted accounts: stores never reuse account ids, so no
    /// operation can succeed against the id afterwards.
    pub fn forget(&self, id: AccountId) {
        self.table.lock().remove(&id);
    }

    /// Number of accounts with a lock slot.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AccountLocks {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl std::fmt::Debug for AccountLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountLocks")
            .field("slots", &self.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    fn ids(raw: &[u64]) -> Vec<AccountId> {
        raw.iter().copied().map(AccountId::new).collect()
    }

    #[test]
    fn acquires_in_ascending_order_without_duplicates() {
        let locks = AccountLocks::default();
        let set = locks.acquire(&ids(&[7, 3, 7, 5])).unwrap();
        assert_eq!(set.ids(), ids(&[3, 5, 7]).as_slice());
        assert!(set.holds(AccountId::new(5)));
        assert!(!set.holds(AccountId::new(4)));
    }

    #[test]
    fn released_on_drop() {
        let locks = AccountLocks::new(Duration::from_millis(10));
        let first = locks.acquire(&ids(&[1])).unwrap();
        drop(first);
        locks.acquire(&ids(&[1])).unwrap();
    }

    #[test]
    fn contended_lock_reports_busy() {
        let locks = Arc::new(AccountLocks::new(Duration::from_millis(20)));
        let _held = locks.acquire(&ids(&[2])).unwrap();

        let other = Arc::clone(&locks);
        let result = thread::spawn(move || other.acquire(&ids(&[1, 2])).map(|_| ()))
            .join()
            .unwrap();
        assert_eq!(result, Err(LedgerError::Busy(AccountId::new(2))));

        // The lock on 1 taken before the timeout was released again.
        let (tx, rx) = mpsc::channel();
        let other = Arc::clone(&locks);
        thread::spawn(move || tx.send(other.acquire(&ids(&[1])).is_ok()).unwrap());
        assert!(rx.recv().unwrap());
    }

    #[test]
    fn opposite_order_requests_do_not_deadlock() {
        let locks = Arc::new(AccountLocks::new(Duration::from_secs(5)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let locks = Arc::clone(&locks);
                thread::spawn(move || {
                    let pair = if i % 2 == 0 { ids(&[1, 2]) } else { ids(&[2, 1]) };
                    for _ in 0..200 {
                        locks.acquire(&pair).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn forget_removes_slot() {
        let locks = AccountLocks::default();
        drop(locks.acquire(&ids(&[4])).unwrap());
        assert_eq!(locks.len(), 1);
        locks.forget(AccountId::new(4));
        assert!(locks.is_empty());
    }

    #[test]
    fn forgotten_slot_no_longer_excludes_its_holder() {
        let locks = AccountLocks::new(Duration::from_millis(10));
        let old = locks.acquire(&ids(&[4])).unwrap();
        locks.forget(AccountId::new(4));

        // A fresh mutex is created for the id while the old guard is live.
        let fresh = locks.acquire(&ids(&[4])).unwrap();
        assert!(old.holds(AccountId::new(4)));
        assert!(fresh.holds(AccountId::new(4)));
        assert_eq!(locks.len(), 1);
    }
}
