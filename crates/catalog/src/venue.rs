use serde::{Deserialize, Serialize};

use dineout_auth::MerchantOwned;
use dineout_core::{UserId, VenueId};

/// A merchant-owned establishment with a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    #[serde(rename = "merchant_id")]
    pub owner_merchant_id: UserId,
    pub name: String,
}

impl Venue {
    pub fn new(owner_merchant_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: VenueId::new(),
            owner_merchant_id,
            name: name.into(),
        }
    }
}

impl MerchantOwned for Venue {
    fn owner_merchant_id(&self) -> UserId {
        self.owner_merchant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_exposed_through_merchant_owned() {
        let owner = UserId::new();
        let venue = Venue::new(owner, "Noodle Bar");

        assert_eq!(venue.owner_merchant_id(), owner);
        assert_ne!(venue.owner_merchant_id(), UserId::new());
    }

    #[test]
    fn serializes_owner_as_merchant_id() {
        let venue = Venue::new(UserId::new(), "Noodle Bar");
        let json = serde_json::to_value(&venue).unwrap();

        assert_eq!(json["merchant_id"], serde_json::json!(venue.owner_merchant_id.to_string()));
    }
}
