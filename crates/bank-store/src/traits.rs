use bank_types::{Account, AccountId, NewAccount, NewOwner, Owner, OwnerId};

use crate::error::StoreResult;

/// Durable keyed storage of accounts.
///
/// Implementations must be thread-safe. Every call is atomic on its own; the
/// ledger engine builds multi-record atomicity on top with its unit of work,
/// so `save` must be usable to restore a previous image of an account.
pub trait AccountStore: Send + Sync {
    /// Read an account by id. `Ok(None)` if it does not exist.
    fn get(&self, id: AccountId) -> StoreResult<Option<Account>>;

    /// All accounts held by `owner`, ordered by id.
    fn find_by_owner(&self, owner: OwnerId) -> StoreResult<Vec<Account>>;

    /// Persist a new account, assigning its id and creation time. Ids are
    /// never reused, even after a delete.
    fn insert(&self, account: NewAccount) -> StoreResult<Account>;

    /// Overwrite an existing account and return the stored image.
    ///
    /// Fails with `NotFound` if the id was never inserted or was deleted.
    fn save(&self, account: &Account) -> StoreResult<Account>;

    /// Delete an account by id. Returns `true` if it existed.
    fn delete(&self, id: AccountId) -> StoreResult<bool>;

    /// All accounts, ordered by id.
    fn list(&self) -> StoreResult<Vec<Account>>;

    /// Check whether an account exists.
    fn exists(&self, id: AccountId) -> StoreResult<bool> {
        Ok(self.get(id)?.is_some())
    }
}

/// Durable keyed storage of owner identities.
pub trait OwnerStore: Send + Sync {
    fn get(&self, id: OwnerId) -> StoreResult<Option<Owner>>;

    /// All owners, ordered by id.
    fn list(&self) -> StoreResult<Vec<Owner>>;

    /// Persist a new owner, assigning its id.
    ///
    /// Fails with `UniqueViolation` if the tax id or phone is already taken.
    fn insert(&self, owner: NewOwner) -> StoreResult<Owner>;

    /// Overwrite an existing owner.
    fn save(&self, owner: &Owner) -> StoreResult<Owner>;

    /// Delete an owner by id. Returns `true` if it existed.
    ///
    /// This does not touch accounts; callers cascade explicitly.
    fn delete(&self, id: OwnerId) -> StoreResult<bool>;

    /// Look up an owner by canonical tax-identity number.
    fn find_by_tax_id(&self, tax_id: &str) -> StoreResult<Option<Owner>> {
        Ok(self.list()?.into_iter().find(|o| o.tax_id == tax_id))
    }

    /// Look up an owner by canonical phone number.
    fn find_by_phone(&self, phone: &str) -> StoreResult<Option<Owner>> {
        Ok(self.list()?.into_iter().find(|o| o.phone == phone))
    }
}
