use std::sync::Arc;

use bank_crypto::CredentialHasher;
use bank_gate::{normalize_phone, normalize_tax_id, rules, InputGate};
use bank_ledger::{AuditReport, InMemoryTransactionLog, LedgerEngine, LedgerError, TransactionLog};
use bank_store::{AccountStore, InMemoryAccountStore, InMemoryOwnerStore, OwnerStore, StoreError};
use bank_types::{
    Account, AccountId, AccountKind, Money, NewAccount, NewOwner, Owner, OwnerId, Transaction,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::BankConfig;
use crate::error::{BankError, BankResult};
use crate::session::Session;

/// Input for [`Bank::register`].
#[derive(Clone)]
pub struct Registration {
    pub tax_id: String,
    pub phone: String,
    pub name: String,
    pub kind: AccountKind,
    pub credential: String,
}

impl Registration {
    pub fn new(
        tax_id: impl Into<String>,
        phone: impl Into<String>,
        name: impl Into<String>,
        kind: AccountKind,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            tax_id: tax_id.into(),
            phone: phone.into(),
            name: name.into(),
            kind,
            credential: credential.into(),
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("tax_id", &self.tax_id)
            .field("phone", &self.phone)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// High-level banking API.
pub struct Bank {
    config: BankConfig,
    owners: Arc<dyn OwnerStore>,
    accounts: Arc<dyn AccountStore>,
    ledger: LedgerEngine,
    gate: InputGate,
    hasher: CredentialHasher,
    // Serializes the check-then-insert of registration and account opening.
    enrolment: Mutex<()>,
}

impl Bank {
    /// A bank over fresh in-memory stores.
    pub fn in_memory(config: BankConfig) -> Self {
        Self::with_stores(
            config,
            Arc::new(InMemoryOwnerStore::new()),
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(InMemoryTransactionLog::new()),
        )
    }

    pub fn with_stores(
        config: BankConfig,
        owners: Arc<dyn OwnerStore>,
        accounts: Arc<dyn AccountStore>,
        log: Arc<dyn TransactionLog>,
    ) -> Self {
        let ledger = LedgerEngine::new(accounts.clone(), log, config.engine());
        Self {
            gate: InputGate::with_default_rules(config.gate()),
            hasher: config.hasher(),
            config,
            owners,
            accounts,
            ledger,
            enrolment: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    pub fn ledger(&self) -> &LedgerEngine {
        &self.ledger
    }

    // ---- Registration and authentication ----

    /// Register a new owner together with their first account.
    ///
    /// The tax number and phone are validated, brought to canonical form and
    /// checked for uniqueness. The owner and the account are created as one
    /// unit: if the account cannot be stored, the owner is removed again.
    pub fn register(&self, registration: &Registration) -> BankResult<Account> {
        self.gate
            .evaluate(&[
                (rules::TAX_ID, registration.tax_id.as_str()),
                (rules::PHONE, registration.phone.as_str()),
                (rules::NAME, registration.name.as_str()),
                (rules::CREDENTIAL, registration.credential.as_str()),
            ])?
            .into_result()?;

        let tax_id = normalize_tax_id(&registration.tax_id)
            .ok_or_else(|| BankError::invalid_input(rules::TAX_ID, "expected eleven digits"))?;
        let phone = normalize_phone(&registration.phone)
            .ok_or_else(|| BankError::invalid_input(rules::PHONE, "expected eleven digits after 55"))?;
        let name = registration.name.trim().to_string();

        let _enrolment = self.enrolment.lock();

        if self.owners.find_by_tax_id(&tax_id)?.is_some() {
            return Err(BankError::DuplicateIdentity);
        }
        if self.owners.find_by_phone(&phone)?.is_some() {
            return Err(BankError::DuplicatePhone);
        }

        let credential = self.hasher.hash(&registration.credential);
        let owner = self
            .owners
            .insert(NewOwner::new(tax_id, phone, name))
            .map_err(unique_violation)?;

        let account = match self
            .accounts
            .insert(NewAccount::new(owner.id, registration.kind, credential))
        {
            Ok(account) => account,
            Err(e) => {
                if let Err(cleanup) = self.owners.delete(owner.id) {
                    error!(owner = %owner.id, error = %cleanup, "failed to remove owner after account insert failed");
                }
                return Err(e.into());
            }
        };

        info!(owner = %owner.id, account = %account.id, kind = %account.kind, "owner registered");
        Ok(account)
    }

    /// Verify `credential` against the stored hash of `account` and open a
    /// session for it.
    pub fn authenticate(&self, account: AccountId, credential: &str) -> BankResult<Session> {
        let stored = self
            .accounts
            .get(account)?
            .ok_or(BankError::AccountNotFound(account))?;

        if !self.hasher.verify(credential, &stored.credential)? {
            warn!(account = %account, "authentication failed");
            return Err(BankError::InvalidCredential);
        }

        let session = Session::open(&stored);
        info!(account = %account, session = %session.short_id(), "session opened");
        Ok(session)
    }

    /// Open another account for the session's owner.
    ///
    /// An owner holds at most one account of each kind.
    pub fn open_account(
        &self,
        session: &Session,
        kind: AccountKind,
        credential: &str,
    ) -> BankResult<Account> {
        self.gate.require(rules::CREDENTIAL, credential)?;

        let _enrolment = self.enrolment.lock();

        let owner = self.owner(session.owner)?;
        if self
            .accounts
            .find_by_owner(owner.id)?
            .iter()
            .any(|a| a.kind == kind)
        {
            return Err(BankError::DuplicateAccountKind(kind));
        }

        let account = self
            .accounts
            .insert(NewAccount::new(owner.id, kind, self.hasher.hash(credential)))?;
        info!(owner = %owner.id, account = %account.id, kind = %kind, "account opened");
        Ok(account)
    }

    // ---- Lookups ----

    pub fn account(&self, id: AccountId) -> BankResult<Account> {
        self.ledger.account(id)?.ok_or(BankError::AccountNotFound(id))
    }

    pub fn owner(&self, id: OwnerId) -> BankResult<Owner> {
        self.owners.get(id)?.ok_or(BankError::OwnerNotFound(id))
    }

    pub fn accounts_of(&self, owner: OwnerId) -> BankResult<Vec<Account>> {
        Ok(self.ledger.accounts_of(owner)?)
    }

    /// Accounts of the owner with this tax number, in any accepted format.
    /// Empty if the number is malformed or unknown.
    pub fn accounts_by_tax_id(&self, tax_id: &str) -> BankResult<Vec<Account>> {
        match normalize_tax_id(tax_id) {
            Some(canonical) => self.accounts_of_owner(self.owners.find_by_tax_id(&canonical)?),
            None => Ok(Vec::new()),
        }
    }

    /// Accounts of the owner with this phone number, in any accepted format.
    /// Empty if the number is malformed or unknown.
    pub fn accounts_by_phone(&self, phone: &str) -> BankResult<Vec<Account>> {
        match normalize_phone(phone) {
            Some(canonical) => self.accounts_of_owner(self.owners.find_by_phone(&canonical)?),
            None => Ok(Vec::new()),
        }
    }

    fn accounts_of_owner(&self, owner: Option<Owner>) -> BankResult<Vec<Account>> {
        match owner {
            Some(owner) => self.accounts_of(owner.id),
            None => Ok(Vec::new()),
        }
    }

    // ---- Ledger operations ----

    pub fn deposit(&self, session: &Session, amount: Money) -> BankResult<Transaction> {
        let account = self.session_account(session, LedgerError::AccountNotFound)?;
        Ok(self.ledger.deposit(&account, amount)?)
    }

    pub fn withdraw(&self, session: &Session, amount: Money) -> BankResult<Transaction> {
        let account = self.session_account(session, LedgerError::AccountNotFound)?;
        Ok(self.ledger.withdraw(&account, amount)?)
    }

    /// Transfer from the session's account to `to`.
    pub fn transfer(&self, session: &Session, to: AccountId, amount: Money) -> BankResult<Transaction> {
        let from = self.session_account(session, LedgerError::SourceNotFound)?;
        let result = match self.ledger.account(to)? {
            Some(destination) => self.ledger.transfer(&from, Some(&destination), amount),
            None => self
                .ledger
                .transfer(&from, None, amount)
                .map_err(|e| match e {
                    LedgerError::DestinationNotFound(None) => LedgerError::DestinationNotFound(Some(to)),
                    other => other,
                }),
        };
        Ok(result?)
    }

    pub fn balance(&self, session: &Session) -> BankResult<Money> {
        Ok(self.ledger.balance(session.account)?)
    }

    /// Transactions of the session's account in commit order.
    pub fn statement(&self, session: &Session) -> BankResult<Vec<Transaction>> {
        Ok(self.ledger.statement(session.account)?)
    }

    fn session_account(
        &self,
        session: &Session,
        missing: fn(AccountId) -> LedgerError,
    ) -> BankResult<Account> {
        match self.ledger.account(session.account)? {
            Some(account) => Ok(account),
            None => {
                debug!(session = %session.short_id(), "session account no longer exists");
                Err(missing(session.account).into())
            }
        }
    }

    // ---- Administration ----

    /// Remove an owner and every account they hold. Returns the number of
    /// accounts removed.
    pub fn close_owner(&self, owner: OwnerId) -> BankResult<usize> {
        let _enrolment = self.enrolment.lock();

        let owner = self.owner(owner)?;
        let accounts = self.accounts.find_by_owner(owner.id)?;
        let ids: Vec<AccountId> = accounts.iter().map(|a| a.id).collect();

        // Wait for in-flight operations on these accounts to finish.
        let locks = self.ledger.locks().acquire(&ids)?;
        for id in &ids {
            self.accounts.delete(*id)?;
        }
        self.owners.delete(owner.id)?;
        drop(locks);
        for id in &ids {
            self.ledger.locks().forget(*id);
        }

        info!(owner = %owner.id, accounts = ids.len(), "owner closed");
        Ok(ids.len())
    }

    /// Replay the transaction log against stored balances.
    pub fn audit(&self) -> BankResult<AuditReport> {
        Ok(self.ledger.audit()?)
    }
}

impl std::fmt::Debug for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bank")
            .field("config", &self.config)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

fn unique_violation(e: StoreError) -> BankError {
    match e {
        StoreError::UniqueViolation { field: "tax_id" } => BankError::DuplicateIdentity,
        StoreError::UniqueViolation { field: "phone" } => BankError::DuplicatePhone,
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bank_ledger::ViolationKind;
    use bank_store::StoreResult;
    use bank_types::TransactionKind;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const PASS: &str = "s3cretpass";

    fn money(v: Decimal) -> Money {
        Money::new(v)
    }

    fn config() -> BankConfig {
        BankConfig {
            credential_rounds: 8,
            ..BankConfig::default()
        }
    }

    fn bank() -> Bank {
        Bank::in_memory(config())
    }

    fn ana(kind: AccountKind) -> Registration {
        Registration::new("123.456.789-09", "+55 (11) 91234-5678", "Ana Souza", kind, PASS)
    }

    fn bruno(kind: AccountKind) -> Registration {
        Registration::new("98765432100", "5521998765432", "Bruno Lima", kind, PASS)
    }

    fn login(bank: &Bank, account: &Account) -> Session {
        bank.authenticate(account.id, PASS).unwrap()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    #[test]
    fn register_stores_canonical_identity_and_hashed_credential() {
        let bank = bank();
        let account = bank.register(&bruno(AccountKind::Business)).unwrap();

        assert_eq!(account.balance, Money::zero());
        assert_eq!(account.kind, AccountKind::Business);
        assert_ne!(account.credential.as_str(), PASS);
        assert!(!account.credential.as_str().contains(PASS));

        let owner = bank.owner(account.owner).unwrap();
        assert_eq!(owner.tax_id, "987.654.321-00");
        assert_eq!(owner.phone, "+55 (21) 99876-5432");
        assert_eq!(owner.name, "Bruno Lima");
    }

    #[test]
    fn register_rejects_duplicates() {
        let bank = bank();
        bank.register(&ana(AccountKind::Checking)).unwrap();

        let same_tax = Registration::new("12345678909", "+55 (11) 90000-0000", "Ana", AccountKind::Savings, PASS);
        assert!(matches!(bank.register(&same_tax), Err(BankError::DuplicateIdentity)));

        let same_phone = Registration::new("98765432100", "5511912345678", "Outra", AccountKind::Savings, PASS);
        assert!(matches!(bank.register(&same_phone), Err(BankError::DuplicatePhone)));
    }

    #[test]
    fn register_validates_inputs() {
        let bank = bank();
        let bad_phone = Registration::new("123.456.789-09", "12345", "Ana", AccountKind::Checking, PASS);
        match bank.register(&bad_phone) {
            Err(BankError::InvalidInput { field, .. }) => assert_eq!(field, rules::PHONE),
            other => panic!("expected invalid phone, got {other:?}"),
        }

        let weak = Registration::new("123.456.789-09", "+5511912345678", "Ana", AccountKind::Checking, "short");
        assert!(matches!(bank.register(&weak), Err(BankError::InvalidInput { .. })));
    }

    #[test]
    fn permissive_inputs_still_require_canonicalizable_numbers() {
        let bank = Bank::in_memory(BankConfig {
            permissive_inputs: true,
            ..config()
        });
        // The weak credential and odd name pass the skipped gate.
        let trusted = Registration::new("11111111111", "11911112222", "R2D2", AccountKind::Checking, "x");
        bank.register(&trusted).unwrap();

        let broken = Registration::new("123", "11911113333", "Ana", AccountKind::Checking, PASS);
        assert!(matches!(bank.register(&broken), Err(BankError::InvalidInput { .. })));
    }

    /// Account store that refuses every insert.
    struct FullAccounts(InMemoryAccountStore);

    impl AccountStore for FullAccounts {
        fn get(&self, id: AccountId) -> StoreResult<Option<Account>> {
            self.0.get(id)
        }
        fn find_by_owner(&self, owner: OwnerId) -> StoreResult<Vec<Account>> {
            self.0.find_by_owner(owner)
        }
        fn insert(&self, _: NewAccount) -> StoreResult<Account> {
            Err(StoreError::Unavailable("no space".into()))
        }
        fn save(&self, account: &Account) -> StoreResult<Account> {
            self.0.save(account)
        }
        fn delete(&self, id: AccountId) -> StoreResult<bool> {
            self.0.delete(id)
        }
        fn list(&self) -> StoreResult<Vec<Account>> {
            self.0.list()
        }
    }

    #[test]
    fn failed_account_insert_removes_owner() {
        let owners = Arc::new(InMemoryOwnerStore::new());
        let bank = Bank::with_stores(
            config(),
            owners.clone(),
            Arc::new(FullAccounts(InMemoryAccountStore::new())),
            Arc::new(InMemoryTransactionLog::new()),
        );

        let err = bank.register(&ana(AccountKind::Checking)).unwrap_err();
        assert!(matches!(err, BankError::Store(StoreError::Unavailable(_))));
        assert!(owners.list().unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Authentication and sessions
    // -----------------------------------------------------------------------

    #[test]
    fn authenticate_checks_credential() {
        let bank = bank();
        let account = bank.register(&ana(AccountKind::Checking)).unwrap();

        let session = bank.authenticate(account.id, PASS).unwrap();
        assert_eq!(session.account, account.id);
        assert_eq!(session.owner, account.owner);

        assert!(matches!(
            bank.authenticate(account.id, "wrongpass1"),
            Err(BankError::InvalidCredential)
        ));
        assert!(matches!(
            bank.authenticate(AccountId::new(404), PASS),
            Err(BankError::AccountNotFound(_))
        ));
    }

    #[test]
    fn concurrent_sessions_are_independent() {
        let bank = bank();
        let a = bank.register(&ana(AccountKind::Checking)).unwrap();
        let b = bank.register(&bruno(AccountKind::Checking)).unwrap();
        let sa = login(&bank, &a);
        let sb = login(&bank, &b);

        bank.deposit(&sa, money(dec!(10))).unwrap();
        bank.deposit(&sb, money(dec!(20))).unwrap();

        assert_eq!(bank.balance(&sa).unwrap(), money(dec!(10)));
        assert_eq!(bank.balance(&sb).unwrap(), money(dec!(20)));
    }

    #[test]
    fn open_account_allows_one_per_kind() {
        let bank = bank();
        let checking = bank.register(&ana(AccountKind::Checking)).unwrap();
        let session = login(&bank, &checking);

        let savings = bank.open_account(&session, AccountKind::Savings, "another1pass").unwrap();
        assert_eq!(savings.owner, checking.owner);
        assert!(bank.authenticate(savings.id, "another1pass").is_ok());

        assert!(matches!(
            bank.open_account(&session, AccountKind::Checking, PASS),
            Err(BankError::DuplicateAccountKind(AccountKind::Checking))
        ));
        assert_eq!(bank.accounts_of(checking.owner).unwrap().len(), 2);
    }

    #[test]
    fn lookup_by_identity_accepts_any_format() {
        let bank = bank();
        let account = bank.register(&ana(AccountKind::Checking)).unwrap();

        assert_eq!(bank.accounts_by_tax_id("12345678909").unwrap(), vec![account.clone()]);
        assert_eq!(bank.accounts_by_phone("+55 11 912345678").unwrap(), vec![account]);
        assert!(bank.accounts_by_tax_id("nonsense").unwrap().is_empty());
        assert!(bank.accounts_by_phone("+55 (21) 91111-2222").unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Ledger operations through sessions
    // -----------------------------------------------------------------------

    #[test]
    fn session_operations_flow() {
        let bank = bank();
        let checking = bank.register(&ana(AccountKind::Checking)).unwrap();
        let session = login(&bank, &checking);
        let savings = bank.open_account(&session, AccountKind::Savings, PASS).unwrap();
        let other = bank.register(&bruno(AccountKind::Checking)).unwrap();

        bank.deposit(&session, money(dec!(200.00))).unwrap();
        bank.transfer(&session, savings.id, money(dec!(50.00))).unwrap();
        bank.transfer(&session, other.id, money(dec!(25.00))).unwrap();
        bank.withdraw(&session, money(dec!(25.00))).unwrap();

        assert_eq!(bank.balance(&session).unwrap(), money(dec!(100.00)));
        assert_eq!(bank.account(savings.id).unwrap().balance, money(dec!(50.00)));
        assert_eq!(bank.account(other.id).unwrap().balance, money(dec!(25.00)));

        let kinds: Vec<_> = bank.statement(&session).unwrap().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::Deposit,
                TransactionKind::Transfer,
                TransactionKind::Transfer,
                TransactionKind::Withdrawal,
            ]
        );
        assert!(bank.audit().unwrap().is_consistent());
    }

    #[test]
    fn savings_session_cannot_transfer_out() {
        let bank = bank();
        let savings = bank.register(&ana(AccountKind::Savings)).unwrap();
        let other = bank.register(&bruno(AccountKind::Checking)).unwrap();
        let session = login(&bank, &savings);
        bank.deposit(&session, money(dec!(500.00))).unwrap();

        let err = bank.transfer(&session, other.id, money(dec!(50.00))).unwrap_err();
        assert!(matches!(err, BankError::Ledger(LedgerError::SavingsTransferNotAllowed(_))));
    }

    #[test]
    fn transfer_to_unknown_account() {
        let bank = bank();
        let account = bank.register(&ana(AccountKind::Checking)).unwrap();
        let session = login(&bank, &account);
        bank.deposit(&session, money(dec!(10))).unwrap();

        let err = bank.transfer(&session, AccountId::new(999), money(dec!(1))).unwrap_err();
        assert!(matches!(
            err,
            BankError::Ledger(LedgerError::DestinationNotFound(Some(id))) if id == AccountId::new(999)
        ));

        // Earlier checks still win over the unknown destination.
        let err = bank.transfer(&session, AccountId::new(999), money(dec!(50))).unwrap_err();
        assert!(matches!(err, BankError::Ledger(LedgerError::InsufficientFunds { .. })));
    }

    #[test]
    fn close_owner_cascades_to_accounts() {
        let bank = bank();
        let checking = bank.register(&ana(AccountKind::Checking)).unwrap();
        let session = login(&bank, &checking);
        bank.open_account(&session, AccountKind::Business, PASS).unwrap();

        assert_eq!(bank.close_owner(checking.owner).unwrap(), 2);
        assert!(matches!(bank.owner(checking.owner), Err(BankError::OwnerNotFound(_))));
        assert!(bank.accounts_of(checking.owner).unwrap().is_empty());
        assert!(matches!(
            bank.deposit(&session, money(dec!(1))),
            Err(BankError::Ledger(LedgerError::AccountNotFound(_)))
        ));

        // The identity is free again.
        bank.register(&ana(AccountKind::Savings)).unwrap();
    }

    #[test]
    fn audit_flags_out_of_band_balance_changes() {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let bank = Bank::with_stores(
            config(),
            Arc::new(InMemoryOwnerStore::new()),
            accounts.clone(),
            Arc::new(InMemoryTransactionLog::new()),
        );
        let account = bank.register(&ana(AccountKind::Checking)).unwrap();
        accounts.save(&account.with_balance(money(dec!(1_000)))).unwrap();

        let report = bank.audit().unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::BalanceMismatch);
    }
}
