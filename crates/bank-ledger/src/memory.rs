use std::collections::HashMap;
use std::sync::RwLock;

use bank_store::{StoreError, StoreResult};
use bank_types::{AccountId, NewTransaction, Transaction, TransactionId};
use chrono::Utc;

use crate::traits::TransactionLog;

/// In-memory transaction log for tests, local demos, and embedding.
pub struct InMemoryTransactionLog {
    inner: RwLock<LogState>,
}

#[derive(Default)]
struct LogState {
    entries: Vec<Transaction>,
    by_account: HashMap<AccountId, Vec<usize>>,
}

impl LogState {
    fn collect(&self, account: AccountId, keep: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
        self.by_account
            .get(&account)
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
            .filter(|t| keep(t))
            .cloned()
            .collect()
    }
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LogState::default()),
        }
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, LogState>> {
        self.inner
            .read()
            .map_err(|_| StoreError::LockPoisoned("transaction log read lock poisoned".into()))
    }
}

impl Default for InMemoryTransactionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn append(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| StoreError::LockPoisoned("transaction log write lock poisoned".into()))?;

        let id = TransactionId::new(state.entries.len() as u64 + 1);
        let now = Utc::now();
        let timestamp = match state.entries.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        let committed = transaction.into_transaction(id, timestamp);
        let index = state.entries.len();
        for account in [committed.sender, committed.receiver].into_iter().flatten() {
            state.by_account.entry(account).or_default().push(index);
        }
        state.entries.push(committed.clone());
        Ok(committed)
    }

    fn list(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self.read()?.entries.clone())
    }

    fn find_by_account(&self, account: AccountId) -> StoreResult<Vec<Transaction>> {
        Ok(self.read()?.collect(account, |_| true))
    }

    fn find_by_sender(&self, account: AccountId) -> StoreResult<Vec<Transaction>> {
        Ok(self.read()?.collect(account, |t| t.sender == Some(account)))
    }

    fn find_by_receiver(&self, account: AccountId) -> StoreResult<Vec<Transaction>> {
        Ok(self.read()?.collect(account, |t| t.receiver == Some(account)))
    }

    fn count(&self) -> StoreResult<u64> {
        Ok(self.read()?.entries.len() as u64)
    }
}

impl std::fmt::Debug for InMemoryTransactionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.count().unwrap_or(0);
        f.debug_struct("InMemoryTransactionLog")
            .field("transaction_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bank_types::{Money, TransactionKind};

    fn acct(n: u64) -> AccountId {
        AccountId::new(n)
    }

    fn money(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn append_assigns_sequential_ids() {
        let log = InMemoryTransactionLog::new();
        let a = log.append(NewTransaction::deposit(acct(1), money(1000)).unwrap()).unwrap();
        let b = log.append(NewTransaction::withdrawal(acct(1), money(500)).unwrap()).unwrap();
        assert_eq!(a.id, TransactionId::new(1));
        assert_eq!(b.id, TransactionId::new(2));
        assert!(b.timestamp >= a.timestamp);
        assert_eq!(log.count().unwrap(), 2);
    }

    #[test]
    fn finds_by_participant() {
        let log = InMemoryTransactionLog::new();
        log.append(NewTransaction::deposit(acct(1), money(1000)).unwrap()).unwrap();
        log.append(NewTransaction::transfer(acct(1), acct(2), money(300)).unwrap()).unwrap();
        log.append(NewTransaction::deposit(acct(2), money(100)).unwrap()).unwrap();
        log.append(NewTransaction::withdrawal(acct(3), money(100)).unwrap()).unwrap();

        assert_eq!(log.find_by_account(acct(1)).unwrap().len(), 2);
        assert_eq!(log.find_by_account(acct(2)).unwrap().len(), 2);

        let sent = log.find_by_sender(acct(1)).unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, TransactionKind::Transfer);

        let received = log.find_by_receiver(acct(2)).unwrap();
        assert_eq!(received.len(), 2);
        assert!(log.find_by_receiver(acct(3)).unwrap().is_empty());
    }

    #[test]
    fn index_matches_default_scan() {
        let log = InMemoryTransactionLog::new();
        for i in 1..=5u64 {
            log.append(NewTransaction::deposit(acct(i % 2), money(100)).unwrap())
                .unwrap();
        }
        let scanned: Vec<_> = log
            .list()
            .unwrap()
            .into_iter()
            .filter(|t| t.involves(acct(1)))
            .collect();
        assert_eq!(log.find_by_account(acct(1)).unwrap(), scanned);
    }

    #[test]
    fn repeated_reads_are_stable() {
        let log = InMemoryTransactionLog::new();
        log.append(NewTransaction::deposit(acct(1), money(1000)).unwrap()).unwrap();
        let first = log.find_by_account(acct(1)).unwrap();
        let second = log.find_by_account(acct(1)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn debug_format() {
        let log = InMemoryTransactionLog::new();
        assert!(format!("{log:?}").contains("transaction_count: 0"));
    }
}
