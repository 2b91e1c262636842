//! High-level API for the banking core.
//!
//! [`Bank`] is the entry point for applications embedding the core. It wires
//! the stores, the input gate, the credential hasher and the ledger engine
//! together, and hands out explicit [`Session`] values in place of any
//! process-wide "current account".

pub mod bank;
pub mod config;
pub mod error;
pub mod session;

pub use bank::{Bank, Registration};
pub use config::BankConfig;
pub use error::{BankError, BankResult};
pub use session::Session;

// Re-export key types
pub use bank_ledger::{AuditReport, LedgerError};
pub use bank_types::{Account, AccountId, AccountKind, Money, Owner, OwnerId, Transaction, TransactionKind};
