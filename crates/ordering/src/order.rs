use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dineout_auth::DinerOwned;
use dineout_catalog::{DinerProfile, MenuItem, Venue};
use dineout_core::{MenuItemId, OrderId, OrderLineId, UserId, VenueId};

use crate::{OrderStatus, PricedOrder};

/// Persisted order line with its frozen price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub menu_item_id: MenuItemId,
    pub quantity: i64,
    /// Price in cents captured at placement; never updated afterwards.
    pub price_in_cents_at_order: i64,
}

/// Order root entity.
///
/// `lines` and `total_amount_in_cents` are fixed at creation; only `status`
/// (and `updated_at`) change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub diner_id: UserId,
    pub venue_id: VenueId,
    pub total_amount_in_cents: i64,
    pub status: OrderStatus,
    pub order_timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "order_items")]
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Build a new `Pending` order from a successful pricing result.
    pub fn place(diner_id: UserId, priced: PricedOrder, now: DateTime<Utc>) -> Self {
        let id = OrderId::new();
        let lines = priced
            .lines
            .into_iter()
            .map(|line| OrderLine {
                id: OrderLineId::new(),
                order_id: id,
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                price_in_cents_at_order: line.price_in_cents_at_order,
            })
            .collect();

        Self {
            id,
            diner_id,
            venue_id: priced.venue_id,
            total_amount_in_cents: priced.total_in_cents,
            status: OrderStatus::Pending,
            order_timestamp: now,
            created_at: now,
            updated_at: now,
            lines,
        }
    }

    /// Σ(quantity × price snapshot), or `None` on overflow.
    pub fn lines_total_in_cents(&self) -> Option<i64> {
        self.lines.iter().try_fold(0i64, |acc, line| {
            line.quantity
                .checked_mul(line.price_in_cents_at_order)
                .and_then(|subtotal| acc.checked_add(subtotal))
        })
    }

    /// Whether the stored total agrees with the line snapshots and every
    /// quantity is positive.
    pub fn is_consistent(&self) -> bool {
        !self.lines.is_empty()
            && self.lines.iter().all(|l| l.quantity > 0 && l.order_id == self.id)
            && self.lines_total_in_cents() == Some(self.total_amount_in_cents)
    }
}

impl DinerOwned for Order {
    fn diner_id(&self) -> UserId {
        self.diner_id
    }
}

/// An order line joined with its (possibly since soft-deleted) menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineDetails {
    #[serde(flatten)]
    pub line: OrderLine,
    pub menu_item: Option<MenuItem>,
}

/// Order graph as returned to callers: order row, lines with menu items,
/// venue and diner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub id: OrderId,
    pub diner_id: UserId,
    pub venue_id: VenueId,
    pub total_amount_in_cents: i64,
    pub status: OrderStatus,
    pub order_timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub order_items: Vec<OrderLineDetails>,
    pub venue: Option<Venue>,
    pub diner: Option<DinerProfile>,
}

impl OrderDetails {
    /// Order with no joined data; used when re-assembly after a committed
    /// write fails.
    pub fn minimal(order: Order) -> Self {
        Self::assemble(order, None, None, |_| None)
    }

    pub fn assemble<F>(
        order: Order,
        venue: Option<Venue>,
        diner: Option<DinerProfile>,
        mut menu_item: F,
    ) -> Self
    where
        F: FnMut(&MenuItemId) -> Option<MenuItem>,
    {
        let order_items = order
            .lines
            .into_iter()
            .map(|line| OrderLineDetails {
                menu_item: menu_item(&line.menu_item_id),
                line,
            })
            .collect();

        Self {
            id: order.id,
            diner_id: order.diner_id,
            venue_id: order.venue_id,
            total_amount_in_cents: order.total_amount_in_cents,
            status: order.status,
            order_timestamp: order.order_timestamp,
            created_at: order.created_at,
            updated_at: order.updated_at,
            order_items,
            venue,
            diner,
        }
    }

    /// Owner of the order's venue, when the venue was joined.
    pub fn venue_owner_id(&self) -> Option<UserId> {
        self.venue.as_ref().map(|v| v.owner_merchant_id)
    }
}

impl DinerOwned for OrderDetails {
    fn diner_id(&self) -> UserId {
        self.diner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderLineRequest, price_against};

    fn placed_order() -> (Order, MenuItem) {
        let venue_id = VenueId::new();
        let soup = MenuItem::new(venue_id, "Soup", 500).unwrap();
        let priced = price_against(venue_id, &[OrderLineRequest::new(soup.id, 3)], &[soup.clone()])
            .unwrap();
        (Order::place(UserId::new(), priced, Utc::now()), soup)
    }

    #[test]
    fn placed_order_is_pending_and_consistent() {
        let (order, soup) = placed_order();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount_in_cents, 1500);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].order_id, order.id);
        assert_eq!(order.lines[0].menu_item_id, soup.id);
        assert_eq!(order.lines[0].price_in_cents_at_order, 500);
        assert!(order.is_consistent());
    }

    #[test]
    fn tampered_total_is_inconsistent() {
        let (mut order, _) = placed_order();
        order.total_amount_in_cents += 1;
        assert!(!order.is_consistent());
    }

    #[test]
    fn minimal_details_keep_lines_without_joins() {
        let (order, _) = placed_order();
        let details = OrderDetails::minimal(order.clone());

        assert_eq!(details.id, order.id);
        assert_eq!(details.order_items.len(), 1);
        assert!(details.order_items[0].menu_item.is_none());
        assert!(details.venue.is_none());
        assert!(details.diner.is_none());
        assert_eq!(details.venue_owner_id(), None);
    }

    #[test]
    fn details_serialize_lines_flat() {
        let (order, soup) = placed_order();
        let details = OrderDetails::assemble(order, None, None, |id| {
            (*id == soup.id).then(|| soup.clone())
        });

        let json = serde_json::to_value(&details).unwrap();
        let line = &json["order_items"][0];
        assert_eq!(line["quantity"], 3);
        assert_eq!(line["price_in_cents_at_order"], 500);
        assert_eq!(line["menu_item"]["name"], "Soup");
        assert_eq!(json["status"], "Pending");
    }
}
