//! Commit boundary for ledger operations.
//!
//! A [`UnitOfWork`] collects the new account images and the transaction
//! record of one operation and applies them together. Account writes go
//! first, the log append last; if any step fails, every account already
//! written is restored to its prior image before the error is returned.
//! Dropping a unit without committing applies nothing.

use bank_store::{AccountStore, StoreError};
use bank_types::{Account, NewTransaction, Transaction};
use tracing::{debug, error};

use crate::error::{LedgerError, LedgerResult};
use crate::traits::TransactionLog;

struct StagedWrite {
    before: Account,
    after: Account,
}

pub struct UnitOfWork<'a> {
    accounts: &'a dyn AccountStore,
    log: &'a dyn TransactionLog,
    entry: NewTransaction,
    staged: Vec<StagedWrite>,
    committed: bool,
}

impl<'a> UnitOfWork<'a> {
    /// Begin a unit that will record `entry` on commit.
    pub fn begin(
        accounts: &'a dyn AccountStore,
        log: &'a dyn TransactionLog,
        entry: NewTransaction,
    ) -> Self {
        Self {
            accounts,
            log,
            entry,
            staged: Vec::new(),
            committed: false,
        }
    }

    /// Stage a replacement for `before`. Writes happen in staging order.
    pub fn stage(&mut self, before: &Account, after: Account) {
        debug_assert_eq!(before.id, after.id);
        self.staged.push(StagedWrite {
            before: before.clone(),
            after,
        });
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Apply every staged write, then append the transaction record.
    pub fn commit(mut self) -> LedgerResult<Transaction> {
        for (applied, write) in self.staged.iter().enumerate() {
            if let Err(e) = self.accounts.save(&write.after) {
                self.restore(applied);
                return Err(self.fail(e));
            }
        }

        match self.log.append(self.entry.clone()) {
            Ok(tx) => {
                self.committed = true;
                Ok(tx)
            }
            Err(e) => {
                self.restore(self.staged.len());
                Err(self.fail(e))
            }
        }
    }

    /// Put back the prior images of the first `applied` writes, newest first.
    fn restore(&self, applied: usize) {
        for write in self.staged[..applied].iter().rev() {
            if let Err(e) = self.accounts.save(&write.before) {
                error!(
                    account = %write.before.id,
                    error = %e,
                    "failed to restore account image; balance may be inconsistent"
                );
            }
        }
    }

    fn fail(&self, cause: StoreError) -> LedgerError {
        error!(error = %cause, writes = self.staged.len(), "unit of work rolled back");
        LedgerError::StorageFailure(cause)
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.committed {
            debug!(writes = self.staged.len(), "unit of work discarded without commit");
        }
    }
}
