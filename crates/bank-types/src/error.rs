use thiserror::Error;

use crate::money::Money;

/// Errors produced by type construction and parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid money value: {0}")]
    InvalidMoney(String),

    #[error("transaction amount must be positive, got {0}")]
    NonPositiveAmount(Money),

    #[error("transfer sender and receiver must differ")]
    SelfTransfer,

    #[error("unknown account kind: {0}")]
    UnknownAccountKind(String),
}
