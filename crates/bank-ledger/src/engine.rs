use std::sync::Arc;
use std::time::Duration;

use bank_store::AccountStore;
use bank_types::{Account, AccountId, AccountKind, Money, NewTransaction, OwnerId, Transaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::audit::{AuditReport, LedgerAudit};
use crate::error::{LedgerError, LedgerResult};
use crate::locks::AccountLocks;
use crate::traits::TransactionLog;
use crate::unit::UnitOfWork;

/// Tuning for the ledger engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long an operation waits for an account lock before failing with
    /// [`LedgerError::Busy`].
    pub lock_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(500),
        }
    }
}

/// Executes deposits, withdrawals, and transfers.
///
/// Each operation validates its inputs, locks the accounts it touches in
/// ascending id order, re-reads them from the store, re-validates against the
/// stored state, and commits through a [`UnitOfWork`]. Either every balance
/// change and the transaction record become visible, or none do.
pub struct LedgerEngine {
    accounts: Arc<dyn AccountStore>,
    log: Arc<dyn TransactionLog>,
    locks: AccountLocks,
}

impl LedgerEngine {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        log: Arc<dyn TransactionLog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            accounts,
            log,
            locks: AccountLocks::new(config.lock_timeout),
        }
    }

    pub fn accounts(&self) -> &dyn AccountStore {
        self.accounts.as_ref()
    }

    pub fn log(&self) -> &dyn TransactionLog {
        self.log.as_ref()
    }

    pub fn locks(&self) -> &AccountLocks {
        &self.locks
    }

    /// Credit `amount` to `account`.
    #[instrument(skip_all, fields(account = %account.id, amount = %amount))]
    pub fn deposit(&self, account: &Account, amount: Money) -> LedgerResult<Transaction> {
        let _locks = self.locks.acquire(&[account.id])?;

        let current = self.load(account.id)?.ok_or(LedgerError::AccountNotFound(account.id))?;
        require_positive(amount)?;

        let balance = current
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(current.id))?;

        let entry = NewTransaction::deposit(current.id, amount)?;
        let mut unit = UnitOfWork::begin(self.accounts(), self.log(), entry);
        unit.stage(&current, current.with_balance(balance));
        let tx = unit.commit()?;

        info!(tx = %tx.id, balance = %balance, "deposit committed");
        Ok(tx)
    }

    /// Debit `amount` from `account`.
    #[instrument(skip_all, fields(account = %account.id, amount = %amount))]
    pub fn withdraw(&self, account: &Account, amount: Money) -> LedgerResult<Transaction> {
        let _locks = self.locks.acquire(&[account.id])?;

        let current = self.load(account.id)?.ok_or(LedgerError::AccountNotFound(account.id))?;
        require_positive(amount)?;
        require_funds(&current, amount)?;

        let balance = current
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::BalanceOverflow(current.id))?;

        let entry = NewTransaction::withdrawal(current.id, amount)?;
        let mut unit = UnitOfWork::begin(self.accounts(), self.log(), entry);
        unit.stage(&current, current.with_balance(balance));
        let tx = unit.commit()?;

        info!(tx = %tx.id, balance = %balance, "withdrawal committed");
        Ok(tx)
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// Checks run in a fixed order and the first failure is reported:
    /// positive amount, source may send, distinct accounts, source funds,
    /// destination given, both accounts exist, same-owner kind rule. The
    /// funds check is repeated against the stored balance once the locks
    /// are held.
    #[instrument(skip_all, fields(from = %from.id, amount = %amount))]
    pub fn transfer(
        &self,
        from: &Account,
        to: Option<&Account>,
        amount: Money,
    ) -> LedgerResult<Transaction> {
        require_positive(amount)?;
        if !from.kind.can_send_transfers() {
            return reject(LedgerError::SavingsTransferNotAllowed(from.id));
        }
        // A self-transfer is refused whatever the balance.
        if to.is_some_and(|to| to.id == from.id) {
            return reject(LedgerError::SameAccountTransfer(from.id));
        }
        require_funds(from, amount)?;
        let to = match to {
            Some(to) => to,
            None => return reject(LedgerError::DestinationNotFound(None)),
        };

        let _locks = self.locks.acquire(&[from.id, to.id])?;

        let source = match self.load(from.id)? {
            Some(account) => account,
            None => return reject(LedgerError::SourceNotFound(from.id)),
        };
        let destination = match self.load(to.id)? {
            Some(account) => account,
            None => return reject(LedgerError::DestinationNotFound(Some(to.id))),
        };
        if source.same_owner(&destination) && !same_owner_allowed(source.kind, destination.kind) {
            return reject(LedgerError::SameOwnerTransferRestricted {
                from: source.kind,
                to: destination.kind,
            });
        }
        require_funds(&source, amount)?;

        let debited = source
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::BalanceOverflow(source.id))?;
        let credited = destination
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(destination.id))?;

        let entry = NewTransaction::transfer(source.id, destination.id, amount)?;
        let mut unit = UnitOfWork::begin(self.accounts(), self.log(), entry);
        unit.stage(&source, source.with_balance(debited));
        unit.stage(&destination, destination.with_balance(credited));
        let tx = unit.commit()?;

        info!(tx = %tx.id, to = %destination.id, "transfer committed");
        Ok(tx)
    }

    /// Every transaction where `account` is sender or receiver, in commit
    /// order. Works for any id, existing or not.
    ///
    /// Waits for an in-flight commit on the account so the statement and
    /// the stored balance describe the same state.
    pub fn statement(&self, account: AccountId) -> LedgerResult<Vec<Transaction>> {
        let _locks = self.locks.acquire(&[account])?;
        Ok(self.log.find_by_account(account)?)
    }

    /// Current stored balance of `account`.
    pub fn balance(&self, account: AccountId) -> LedgerResult<Money> {
        self.account(account)?
            .map(|a| a.balance)
            .ok_or(LedgerError::AccountNotFound(account))
    }

    /// Read one account under its lock. Balances staged by a commit that
    /// has not finished are never returned.
    pub fn account(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        let _locks = self.locks.acquire(&[id])?;
        self.load(id)
    }

    /// Read every account of `owner` under their locks.
    pub fn accounts_of(&self, owner: OwnerId) -> LedgerResult<Vec<Account>> {
        let ids: Vec<AccountId> = self.accounts.find_by_owner(owner)?.iter().map(|a| a.id).collect();
        let locks = self.locks.acquire(&ids)?;
        Ok(self
            .accounts
            .find_by_owner(owner)?
            .into_iter()
            .filter(|a| locks.holds(a.id))
            .collect())
    }

    /// Audit the log against stored balances while no commit is in flight.
    ///
    /// Holds the lock of every stored account for the duration of the
    /// replay. Accounts opened between listing and locking are picked up
    /// by listing again until the locked set covers the store.
    pub fn audit(&self) -> LedgerResult<AuditReport> {
        let mut ids = self.account_ids()?;
        loop {
            let locks = self.locks.acquire(&ids)?;
            let current = self.account_ids()?;
            if current.iter().all(|id| locks.holds(*id)) {
                return LedgerAudit::run(self.accounts(), self.log());
            }
            debug!(accounts = current.len(), "accounts opened during audit; relocking");
            ids = current;
        }
    }

    fn account_ids(&self) -> LedgerResult<Vec<AccountId>> {
        Ok(self.accounts.list()?.iter().map(|a| a.id).collect())
    }

    fn load(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        Ok(self.accounts.get(id)?)
    }
}

impl std::fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

/// Same-owner transfers are only allowed from checking into savings.
fn same_owner_allowed(from: AccountKind, to: AccountKind) -> bool {
    from == AccountKind::Checking && to == AccountKind::Savings
}

fn require_positive(amount: Money) -> LedgerResult<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        reject(LedgerError::InvalidAmount(amount))
    }
}

fn require_funds(account: &Account, amount: Money) -> LedgerResult<()> {
    if account.balance >= amount {
        Ok(())
    } else {
        reject(LedgerError::InsufficientFunds {
            account: account.id,
            available: account.balance,
            requested: amount,
        })
    }
}

fn reject<T>(error: LedgerError) -> LedgerResult<T> {
    debug!(%error, "operation rejected");
    Err(error)
}
