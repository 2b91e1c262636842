use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{AccountId, OwnerId};
use crate::money::Money;

/// Classification of an account.
///
/// An owner holds at most one account of each kind. Savings accounts may
/// receive transfers but never send them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Checking,
    Savings,
    Business,
}

impl AccountKind {
    pub const ALL: [AccountKind; 3] = [Self::Checking, Self::Savings, Self::Business];

    /// Whether this kind may be the sending side of a transfer.
    pub fn can_send_transfers(&self) -> bool {
        !matches!(self, Self::Savings)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "CHECKING",
            Self::Savings => "SAVINGS",
            Self::Business => "BUSINESS",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHECKING" => Ok(Self::Checking),
            "SAVINGS" => Ok(Self::Savings),
            "BUSINESS" => Ok(Self::Business),
            other => Err(TypeError::UnknownAccountKind(other.to_string())),
        }
    }
}

/// Stored one-way hash of an account credential.
///
/// The encoded form is opaque to this crate; `bank-crypto` produces and
/// verifies it. `Debug` never prints the hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(..)")
    }
}

/// A balance-holding account owned by exactly one [`crate::Owner`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owner: OwnerId,
    pub kind: AccountKind,
    pub balance: Money,
    pub credential: CredentialHash,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Whether `self` and `other` share an owner.
    pub fn same_owner(&self, other: &Account) -> bool {
        self.owner == other.owner
    }

    /// Copy of this account with a different balance.
    pub fn with_balance(&self, balance: Money) -> Self {
        Self {
            balance,
            ..self.clone()
        }
    }
}

/// An account before the store has assigned it an identifier.
///
/// New accounts always start at a zero balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub owner: OwnerId,
    pub kind: AccountKind,
    pub credential: CredentialHash,
}

impl NewAccount {
    pub fn new(owner: OwnerId, kind: AccountKind, credential: CredentialHash) -> Self {
        Self {
            owner,
            kind,
            credential,
        }
    }

    /// Materialize with the identifier and timestamp the store assigned.
    pub fn into_account(self, id: AccountId, created_at: DateTime<Utc>) -> Account {
        Account {
            id,
            owner: self.owner,
            kind: self.kind,
            balance: Money::zero(),
            credential: self.credential,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_savings_cannot_send() {
        assert!(AccountKind::Checking.can_send_transfers());
        assert!(AccountKind::Business.can_send_transfers());
        assert!(!AccountKind::Savings.can_send_transfers());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("savings".parse::<AccountKind>().unwrap(), AccountKind::Savings);
        assert_eq!(" Business ".parse::<AccountKind>().unwrap(), AccountKind::Business);
        assert!("brokerage".parse::<AccountKind>().is_err());
    }

    #[test]
    fn kind_serializes_upper_case() {
        let json = serde_json::to_string(&AccountKind::Checking).unwrap();
        assert_eq!(json, "\"CHECKING\"");
    }

    #[test]
    fn new_account_starts_at_zero() {
        let account = NewAccount::new(
            OwnerId::new(1),
            AccountKind::Checking,
            CredentialHash::from_encoded("h"),
        )
        .into_account(AccountId::new(10), Utc::now());
        assert_eq!(account.balance, Money::zero());
        assert_eq!(account.id, AccountId::new(10));
    }

    #[test]
    fn credential_debug_is_redacted() {
        let hash = CredentialHash::from_encoded("secret-material");
        assert!(!format!("{hash:?}").contains("secret"));
    }
}
