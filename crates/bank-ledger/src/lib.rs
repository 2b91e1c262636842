//! Ledger engine for the banking core.
//!
//! This crate is the heart of the system. It provides:
//! - The [`TransactionLog`] trait boundary and [`InMemoryTransactionLog`]
//! - [`LedgerEngine`]: deposit, withdraw and transfer with all-or-nothing
//!   semantics over an [`bank_store::AccountStore`] and a transaction log
//! - [`AccountLocks`]: per-account exclusion taken in ascending id order
//! - [`UnitOfWork`]: the commit boundary shared by account writes and the
//!   log append
//! - [`LedgerAudit`]: replay of the log against stored balances
//!
//! The engine is the only writer of balances and the only creator of
//! transaction records.

pub mod audit;
pub mod engine;
pub mod error;
pub mod locks;
pub mod memory;
pub mod traits;
pub mod unit;

pub use audit::{AuditReport, LedgerAudit, Violation, ViolationKind};
pub use engine::{EngineConfig, LedgerEngine};
pub use error::{LedgerError, LedgerResult};
pub use locks::{AccountLocks, LockSet};
pub use memory::InMemoryTransactionLog;
pub use traits::TransactionLog;
pub use unit::UnitOfWork;
