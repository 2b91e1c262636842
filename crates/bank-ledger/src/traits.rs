use bank_store::StoreResult;
use bank_types::{AccountId, NewTransaction, Transaction};

/// Append-only storage of committed transactions.
///
/// There is no update or delete. Implementations assign ids in append order
/// and timestamps that never go backwards, so the log order is the commit
/// order.
pub trait TransactionLog: Send + Sync {
    /// Persist a transaction, assigning its id and timestamp.
    fn append(&self, transaction: NewTransaction) -> StoreResult<Transaction>;

    /// Every transaction in commit order.
    fn list(&self) -> StoreResult<Vec<Transaction>>;

    /// Transactions where `account` is sender or receiver, in commit order.
    fn find_by_account(&self, account: AccountId) -> StoreResult<Vec<Transaction>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|t| t.involves(account))
            .collect())
    }

    /// Transactions sent by `account`, in commit order.
    fn find_by_sender(&self, account: AccountId) -> StoreResult<Vec<Transaction>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|t| t.sender == Some(account))
            .collect())
    }

    /// Transactions received by `account`, in commit order.
    fn find_by_receiver(&self, account: AccountId) -> StoreResult<Vec<Transaction>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|t| t.receiver == Some(account))
            .collect())
    }

    /// Number of committed transactions.
    fn count(&self) -> StoreResult<u64> {
        Ok(self.list()?.len() as u64)
    }
}
