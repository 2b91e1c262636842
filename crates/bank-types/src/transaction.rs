use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{AccountId, TransactionId};
use crate::money::Money;

/// Kind of ledger movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::Transfer => "TRANSFER",
        })
    }
}

/// A transaction that has not yet been appended to the log.
///
/// Fields are private: the three constructors are the only way to build one,
/// so every value satisfies the shape invariants below.
///
/// | kind       | sender | receiver |
/// |------------|--------|----------|
/// | Deposit    | none   | set      |
/// | Withdrawal | set    | none     |
/// | Transfer   | set    | set, != sender |
///
/// The amount is always strictly positive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewTransaction {
    kind: TransactionKind,
    sender: Option<AccountId>,
    receiver: Option<AccountId>,
    amount: Money,
}

impl NewTransaction {
    pub fn deposit(receiver: AccountId, amount: Money) -> Result<Self, TypeError> {
        Self::checked(TransactionKind::Deposit, None, Some(receiver), amount)
    }

    pub fn withdrawal(sender: AccountId, amount: Money) -> Result<Self, TypeError> {
        Self::checked(TransactionKind::Withdrawal, Some(sender), None, amount)
    }

    pub fn transfer(
        sender: AccountId,
        receiver: AccountId,
        amount: Money,
    ) -> Result<Self, TypeError> {
        if sender == receiver {
            return Err(TypeError::SelfTransfer);
        }
        Self::checked(TransactionKind::Transfer, Some(sender), Some(receiver), amount)
    }

    fn checked(
        kind: TransactionKind,
        sender: Option<AccountId>,
        receiver: Option<AccountId>,
        amount: Money,
    ) -> Result<Self, TypeError> {
        if !amount.is_positive() {
            return Err(TypeError::NonPositiveAmount(amount));
        }
        Ok(Self {
            kind,
            sender,
            receiver,
            amount,
        })
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn sender(&self) -> Option<AccountId> {
        self.sender
    }

    pub fn receiver(&self) -> Option<AccountId> {
        self.receiver
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Materialize with the identifier and timestamp the log assigned.
    pub fn into_transaction(self, id: TransactionId, timestamp: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            kind: self.kind,
            sender: self.sender,
            receiver: self.receiver,
            amount: self.amount,
            timestamp,
        }
    }
}

/// An immutable, committed ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub sender: Option<AccountId>,
    pub receiver: Option<AccountId>,
    pub amount: Money,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Whether `account` took part as sender or receiver.
    pub fn involves(&self, account: AccountId) -> bool {
        self.sender == Some(account) || self.receiver == Some(account)
    }

    /// Signed effect of this transaction on `account`'s balance.
    pub fn effect_on(&self, account: AccountId) -> Money {
        let mut effect = Money::zero();
        if self.receiver == Some(account) {
            effect = effect.checked_add(self.amount).unwrap_or(effect);
        }
        if self.sender == Some(account) {
            effect = effect.checked_sub(self.amount).unwrap_or(effect);
        }
        effect
    }

    /// Re-check the shape invariants on a record read back from storage.
    pub fn shape_is_valid(&self) -> bool {
        let shape_ok = match self.kind {
            TransactionKind::Deposit => self.sender.is_none() && self.receiver.is_some(),
            TransactionKind::Withdrawal => self.sender.is_some() && self.receiver.is_none(),
            TransactionKind::Transfer => match (self.sender, self.receiver) {
                (Some(s), Some(r)) => s != r,
                _ => false,
            },
        };
        shape_ok && self.amount.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(v: rust_decimal::Decimal) -> Money {
        Money::new(v)
    }

    #[test]
    fn deposit_has_receiver_only() {
        let tx = NewTransaction::deposit(AccountId::new(1), amount(dec!(10))).unwrap();
        assert_eq!(tx.kind(), TransactionKind::Deposit);
        assert_eq!(tx.sender(), None);
        assert_eq!(tx.receiver(), Some(AccountId::new(1)));
    }

    #[test]
    fn withdrawal_has_sender_only() {
        let tx = NewTransaction::withdrawal(AccountId::new(1), amount(dec!(10))).unwrap();
        assert_eq!(tx.sender(), Some(AccountId::new(1)));
        assert_eq!(tx.receiver(), None);
    }

    #[test]
    fn transfer_rejects_same_account() {
        let err = NewTransaction::transfer(AccountId::new(1), AccountId::new(1), amount(dec!(1)))
            .unwrap_err();
        assert_eq!(err, TypeError::SelfTransfer);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let zero = NewTransaction::deposit(AccountId::new(1), Money::zero()).unwrap_err();
        assert_eq!(zero, TypeError::NonPositiveAmount(Money::zero()));
        assert!(NewTransaction::withdrawal(AccountId::new(1), amount(dec!(-5))).is_err());
    }

    #[test]
    fn effect_on_participants() {
        let tx = NewTransaction::transfer(AccountId::new(1), AccountId::new(2), amount(dec!(7.5)))
            .unwrap()
            .into_transaction(TransactionId::new(1), Utc::now());
        assert_eq!(tx.effect_on(AccountId::new(1)), amount(dec!(-7.5)));
        assert_eq!(tx.effect_on(AccountId::new(2)), amount(dec!(7.5)));
        assert_eq!(tx.effect_on(AccountId::new(3)), Money::zero());
        assert!(tx.involves(AccountId::new(2)));
        assert!(!tx.involves(AccountId::new(3)));
        assert!(tx.shape_is_valid());
    }

    #[test]
    fn tampered_shape_is_detected() {
        let mut tx = NewTransaction::deposit(AccountId::new(4), amount(dec!(1)))
            .unwrap()
            .into_transaction(TransactionId::new(1), Utc::now());
        tx.sender = Some(AccountId::new(5));
        assert!(!tx.shape_is_valid());
    }
}
