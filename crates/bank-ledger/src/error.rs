use bank_store::StoreError;
use bank_types::{AccountId, AccountKind, Money, TypeError};

/// Errors produced by ledger operations.
///
/// Every variant is recoverable and reported to the caller. Validation
/// failures leave no trace; `StorageFailure` is returned only after any
/// partially applied writes have been rolled back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("account {0} does not exist")]
    AccountNotFound(AccountId),

    #[error("source account {0} does not exist")]
    SourceNotFound(AccountId),

    #[error("destination account does not exist")]
    DestinationNotFound(Option<AccountId>),

    #[error("amount must be greater than zero, got {0}")]
    InvalidAmount(Money),

    #[error("insufficient funds in {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        available: Money,
        requested: Money,
    },

    #[error("savings account {0} cannot send transfers")]
    SavingsTransferNotAllowed(AccountId),

    #[error("cannot transfer from {0} to itself")]
    SameAccountTransfer(AccountId),

    #[error("transfers between accounts of the same owner are only allowed from CHECKING to SAVINGS, not {from} to {to}")]
    SameOwnerTransferRestricted { from: AccountKind, to: AccountKind },

    #[error("balance of {0} would overflow")]
    BalanceOverflow(AccountId),

    #[error("invalid transaction record: {0}")]
    InvalidRecord(#[from] TypeError),

    #[error("account {0} is busy; lock not acquired in time")]
    Busy(AccountId),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] StoreError),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
