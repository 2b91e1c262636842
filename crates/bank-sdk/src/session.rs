use bank_types::{Account, AccountId, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated context, passed explicitly into every account-bound call.
///
/// A session names the account it was opened for; it holds no balance and
/// no credential. Any number of sessions may be live at once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub account: AccountId,
    pub owner: OwnerId,
    pub opened_at: DateTime<Utc>,
}

impl Session {
    /// Open a session for an account that has just been authenticated.
    pub(crate) fn open(account: &Account) -> Self {
        Self {
            id: Uuid::now_v7(),
            account: account.id,
            owner: account.owner,
            opened_at: Utc::now(),
        }
    }

    /// First 8 hex characters of the session id, for display.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{} ({})", self.short_id(), self.account)
    }
}
