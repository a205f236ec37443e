use serde::{Deserialize, Serialize};

use dineout_core::{DomainError, DomainResult, MenuItemId, VenueId};

/// A priced, venue-scoped product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub venue_id: VenueId,
    pub name: String,
    /// Price in smallest currency unit (e.g., cents). Never negative.
    pub price_in_cents: i64,
}

impl MenuItem {
    pub fn new(venue_id: VenueId, name: impl Into<String>, price_in_cents: i64) -> DomainResult<Self> {
        if price_in_cents < 0 {
            return Err(DomainError::validation("price_in_cents must not be negative"));
        }
        Ok(Self {
            id: MenuItemId::new(),
            venue_id,
            name: name.into(),
            price_in_cents,
        })
    }

    pub fn belongs_to(&self, venue_id: VenueId) -> bool {
        self.venue_id == venue_id
    }
}
