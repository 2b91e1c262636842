//! Account and owner storage for the banking core.
//!
//! Stores are passive: they assign identifiers and hold records, but carry
//! no business rules. Balances are only ever changed by the ledger engine,
//! which calls [`AccountStore::save`] inside its unit of work.
//!
//! # Storage Backends
//!
//! All backends implement [`AccountStore`] and [`OwnerStore`]:
//!
//! - [`InMemoryAccountStore`] / [`InMemoryOwnerStore`] -- `HashMap`-based
//!   stores for tests and embedding
//!
//! # Design Rules
//!
//! 1. Identifiers are assigned on insert and never reused.
//! 2. `save` updates an existing record; it never creates one.
//! 3. Owner tax-identity and phone numbers are unique, like a database
//!    unique index.
//! 4. All lock and backend errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryAccountStore, InMemoryOwnerStore};
pub use traits::{AccountStore, OwnerStore};
