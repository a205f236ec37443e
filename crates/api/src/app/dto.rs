use serde::{Deserialize, Serialize};

use dineout_auth::Principal;
use dineout_core::{MenuItemId, VenueId};
use dineout_ordering::OrderLineRequest;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub venue_id: VenueId,
    pub items: Vec<PlaceOrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderItem {
    pub menu_item_id: MenuItemId,
    /// Left optional so a missing quantity is reported per line.
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl PlaceOrderRequest {
    pub fn lines(&self) -> Vec<OrderLineRequest> {
        self.items
            .iter()
            .map(|item| OrderLineRequest {
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub user_id: String,
    pub role: &'static str,
}

impl From<&Principal> for AccountResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            user_id: principal.user_id.to_string(),
            role: principal.role.as_str(),
        }
    }
}
