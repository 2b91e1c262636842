//! Foundation types for the banking core.
//!
//! Every other crate in the workspace depends on `bank-types`. It defines the
//! records that flow between the stores and the ledger engine, and the
//! invariants those records carry by construction.
//!
//! # Key Types
//!
//! - [`AccountId`], [`OwnerId`], [`TransactionId`]: numeric identifiers assigned by stores
//! - [`Money`]: exact decimal amount (never binary floating point)
//! - [`Account`] / [`NewAccount`]: balance-holding record and its pre-insert form
//! - [`Owner`] / [`NewOwner`]: identity holding one or more accounts
//! - [`Transaction`] / [`NewTransaction`]: immutable ledger entry and its pre-append form

pub mod account;
pub mod error;
pub mod ids;
pub mod money;
pub mod owner;
pub mod transaction;

pub use account::{Account, AccountKind, CredentialHash, NewAccount};
pub use error::TypeError;
pub use ids::{AccountId, OwnerId, TransactionId};
pub use money::Money;
pub use owner::{NewOwner, Owner};
pub use transaction::{NewTransaction, Transaction, TransactionKind};
