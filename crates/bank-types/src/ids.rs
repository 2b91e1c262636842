use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw identifier value.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw numeric value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        /// Accepts the display form or the bare number.
        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                s.strip_prefix($prefix).unwrap_or(s).parse().map(Self)
            }
        }
    };
}

numeric_id!(
    /// Identifier of an account, assigned by the account store on insert.
    ///
    /// Ordering is used by the ledger engine to take per-account locks in a
    /// deterministic sequence.
    AccountId,
    "acct:"
);

numeric_id!(
    /// Identifier of an owner identity.
    OwnerId,
    "owner:"
);

numeric_id!(
    /// Identifier of a committed ledger transaction. Increases with commit order.
    TransactionId,
    "tx:"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_prefix() {
        assert_eq!(AccountId::new(7).to_string(), "acct:7");
        assert_eq!(OwnerId::new(3).to_string(), "owner:3");
        assert_eq!(TransactionId::new(12).to_string(), "tx:12");
    }

    #[test]
    fn ordering_follows_raw_value() {
        assert!(AccountId::new(1) < AccountId::new(2));
        let mut ids = vec![AccountId::new(9), AccountId::new(2), AccountId::new(5)];
        ids.sort();
        assert_eq!(ids, vec![AccountId::new(2), AccountId::new(5), AccountId::new(9)]);
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&AccountId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AccountId::new(42));
    }

    #[test]
    fn parses_display_form_and_bare_number() {
        assert_eq!("acct:7".parse::<AccountId>().unwrap(), AccountId::new(7));
        assert_eq!(" 7 ".parse::<AccountId>().unwrap(), AccountId::new(7));
        assert!("owner:7".parse::<AccountId>().is_err());
        assert!("-1".parse::<AccountId>().is_err());
    }

    #[test]
    fn debug_includes_type_name() {
        assert_eq!(format!("{:?}", OwnerId::new(1)), "OwnerId(1)");
    }
}
