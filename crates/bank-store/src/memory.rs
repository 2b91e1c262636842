//! In-memory stores for testing and embedding.
//!
//! Records live in `BTreeMap`s behind `RwLock`s, so listings come back in id
//! order. Data is lost when the store is dropped.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use bank_types::{Account, AccountId, NewAccount, NewOwner, Owner, OwnerId};
use chrono::Utc;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{AccountStore, OwnerStore};

struct Table<K, V> {
    next_id: u64,
    rows: BTreeMap<K, V>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<K, V> Table<K, V> {
    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| StoreError::LockPoisoned(e.to_string()))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| StoreError::LockPoisoned(e.to_string()))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// In-memory implementation of [`AccountStore`].
#[derive(Default)]
pub struct InMemoryAccountStore {
    table: RwLock<Table<AccountId, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        read(&self.table).map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(read(&self.table)?.rows.get(&id).cloned())
    }

    fn find_by_owner(&self, owner: OwnerId) -> StoreResult<Vec<Account>> {
        Ok(read(&self.table)?
            .rows
            .values()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect())
    }

    fn insert(&self, account: NewAccount) -> StoreResult<Account> {
        let mut table = write(&self.table)?;
        let id = AccountId::new(table.allocate());
        let account = account.into_account(id, Utc::now());
        table.rows.insert(id, account.clone());
        debug!(account = %id, kind = %account.kind, "account inserted");
        Ok(account)
    }

    fn save(&self, account: &Account) -> StoreResult<Account> {
        let mut table = write(&self.table)?;
        let slot = table.rows.get_mut(&account.id).ok_or(StoreError::NotFound {
            entity: "account",
            id: account.id.get(),
        })?;
        *slot = account.clone();
        Ok(account.clone())
    }

    fn delete(&self, id: AccountId) -> StoreResult<bool> {
        Ok(write(&self.table)?.rows.remove(&id).is_some())
    }

    fn list(&self) -> StoreResult<Vec<Account>> {
        Ok(read(&self.table)?.rows.values().cloned().collect())
    }
}

impl std::fmt::Debug for InMemoryAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAccountStore")
            .field("account_count", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Owners
// ---------------------------------------------------------------------------

/// In-memory implementation of [`OwnerStore`] with unique tax-id and phone
/// indexes.
#[derive(Default)]
pub struct InMemoryOwnerStore {
    table: RwLock<Table<OwnerId, Owner>>,
}

impl InMemoryOwnerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        read(&self.table).map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_unique(
        rows: &BTreeMap<OwnerId, Owner>,
        skip: Option<OwnerId>,
        tax_id: &str,
        phone: &str,
    ) -> StoreResult<()> {
        for other in rows.values().filter(|o| Some(o.id) != skip) {
            if other.tax_id == tax_id {
                return Err(StoreError::UniqueViolation { field: "tax_id" });
            }
            if other.phone == phone {
                return Err(StoreError::UniqueViolation { field: "phone" });
            }
        }
        Ok(())
    }
}

impl OwnerStore for InMemoryOwnerStore {
    fn get(&self, id: OwnerId) -> StoreResult<Option<Owner>> {
        Ok(read(&self.table)?.rows.get(&id).cloned())
    }

    fn list(&self) -> StoreResult<Vec<Owner>> {
        Ok(read(&self.table)?.rows.values().cloned().collect())
    }

    fn insert(&self, owner: NewOwner) -> StoreResult<Owner> {
        let mut table = write(&self.table)?;
        Self::check_unique(&table.rows, None, &owner.tax_id, &owner.phone)?;
        let id = OwnerId::new(table.allocate());
        let owner = owner.into_owner(id);
        table.rows.insert(id, owner.clone());
        debug!(owner = %id, "owner inserted");
        Ok(owner)
    }

    fn save(&self, owner: &Owner) -> StoreResult<Owner> {
        let mut table = write(&self.table)?;
        if !table.rows.contains_key(&owner.id) {
            return Err(StoreError::NotFound {
                entity: "owner",
                id: owner.id.get(),
            });
        }
        Self::check_unique(&table.rows, Some(owner.id), &owner.tax_id, &owner.phone)?;
        table.rows.insert(owner.id, owner.clone());
        Ok(owner.clone())
    }

    fn delete(&self, id: OwnerId) -> StoreResult<bool> {
        Ok(write(&self.table)?.rows.remove(&id).is_some())
    }
}

impl std::fmt::Debug for InMemoryOwnerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryOwnerStore")
            .field("owner_count", &self.len())
            .finish()
    }
}
