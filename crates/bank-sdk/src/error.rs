use bank_gate::GateError;
use bank_types::{AccountId, AccountKind, OwnerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BankError {
    #[error("an owner is already registered with this tax identity number")]
    DuplicateIdentity,

    #[error("an owner is already registered with this phone number")]
    DuplicatePhone,

    #[error("owner already holds a {0} account")]
    DuplicateAccountKind(AccountKind),

    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    #[error("owner {0} not found")]
    OwnerNotFound(OwnerId),

    #[error("incorrect credential")]
    InvalidCredential,

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("gate error: {0}")]
    Gate(GateError),

    #[error(transparent)]
    Ledger(#[from] bank_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] bank_store::StoreError),

    #[error("credential error: {0}")]
    Credential(#[from] bank_crypto::CredentialError),
}

impl BankError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<GateError> for BankError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Rejected { rule, reason } => Self::InvalidInput {
                field: rule,
                reason,
            },
            other => Self::Gate(other),
        }
    }
}

pub type BankResult<T> = Result<T, BankError>;
