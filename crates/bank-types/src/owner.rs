use serde::{Deserialize, Serialize};

use crate::ids::OwnerId;

/// An owner identity. Holds one or more accounts.
///
/// `tax_id` and `phone` are kept in canonical textual form and are each
/// unique across all owners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    pub tax_id: String,
    pub phone: String,
    pub name: String,
}

/// An owner before the store has assigned it an identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOwner {
    pub tax_id: String,
    pub phone: String,
    pub name: String,
}

impl NewOwner {
    pub fn new(tax_id: impl Into<String>, phone: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tax_id: tax_id.into(),
            phone: phone.into(),
            name: name.into(),
        }
    }

    pub fn into_owner(self, id: OwnerId) -> Owner {
        Owner {
            id,
            tax_id: self.tax_id,
            phone: self.phone,
            name: self.name,
        }
    }
}
