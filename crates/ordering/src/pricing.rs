//! Pure pricing of a requested cart.
//!
//! Resolution of menu items is done by the caller (one batch lookup scoped to
//! the venue); this module only validates the request and prices it against
//! whatever the lookup returned. All arithmetic is checked integer cents.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dineout_catalog::MenuItem;
use dineout_core::{MenuItemId, VenueId};

/// One requested cart line (ephemeral input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub menu_item_id: MenuItemId,
    /// `None` when the caller omitted the quantity.
    pub quantity: Option<i64>,
}

impl OrderLineRequest {
    pub fn new(menu_item_id: MenuItemId, quantity: i64) -> Self {
        Self {
            menu_item_id,
            quantity: Some(quantity),
        }
    }
}

/// A priced line, not yet attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub menu_item_id: MenuItemId,
    pub quantity: i64,
    pub price_in_cents_at_order: i64,
}

impl PricedLine {
    pub fn subtotal_in_cents(&self) -> Option<i64> {
        self.quantity.checked_mul(self.price_in_cents_at_order)
    }
}

/// Result of a successful pricing attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedOrder {
    pub venue_id: VenueId,
    /// Same order as the request.
    pub lines: Vec<PricedLine>,
    pub total_in_cents: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("menu item {menu_item_id} is not available at this venue")]
    ItemNotAvailable { menu_item_id: MenuItemId },
}

impl PricingError {
    fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

/// Reject empty carts and non-positive or missing quantities.
pub fn validate_request(lines: &[OrderLineRequest]) -> Result<(), PricingError> {
    if lines.is_empty() {
        return Err(PricingError::invalid("order must contain at least one item"));
    }

    for (idx, line) in lines.iter().enumerate() {
        match line.quantity {
            None => {
                return Err(PricingError::invalid(format!(
                    "items[{idx}] (menu item {}): quantity is required",
                    line.menu_item_id
                )));
            }
            Some(q) if q <= 0 => {
                return Err(PricingError::invalid(format!(
                    "items[{idx}] (menu item {}): quantity must be positive, got {q}",
                    line.menu_item_id
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Distinct requested menu item ids, in first-seen order.
pub fn distinct_item_ids(lines: &[OrderLineRequest]) -> Vec<MenuItemId> {
    let mut seen = HashSet::with_capacity(lines.len());
    lines
        .iter()
        .map(|l| l.menu_item_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Price `lines` against the menu items resolved for `venue_id`.
///
/// All-or-nothing: any line whose item is missing from `resolved`, or
/// resolved but belonging to another venue, fails the whole attempt.
pub fn price_against(
    venue_id: VenueId,
    lines: &[OrderLineRequest],
    resolved: &[MenuItem],
) -> Result<PricedOrder, PricingError> {
    validate_request(lines)?;

    let menu: HashMap<MenuItemId, &MenuItem> = resolved
        .iter()
        .filter(|item| item.belongs_to(venue_id))
        .map(|item| (item.id, item))
        .collect();

    let mut priced = Vec::with_capacity(lines.len());
    let mut total: i64 = 0;

    for line in lines {
        let item = menu
            .get(&line.menu_item_id)
            .ok_or(PricingError::ItemNotAvailable {
                menu_item_id: line.menu_item_id,
            })?;

        // validate_request guarantees a positive quantity.
        let quantity = line.quantity.unwrap_or_default();
        let priced_line = PricedLine {
            menu_item_id: item.id,
            quantity,
            price_in_cents_at_order: item.price_in_cents,
        };

        total = priced_line
            .subtotal_in_cents()
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| PricingError::invalid("order total overflows"))?;
        priced.push(priced_line);
    }

    Ok(PricedOrder {
        venue_id,
        lines: priced,
        total_in_cents: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(venue_id: VenueId, price: i64) -> MenuItem {
        MenuItem::new(venue_id, "item", price).unwrap()
    }

    #[test]
    fn empty_cart_is_invalid() {
        let err = price_against(VenueId::new(), &[], &[]).unwrap_err();
        assert!(matches!(err, PricingError::InvalidRequest(_)));
    }

    #[test]
    fn zero_and_negative_quantities_name_the_line() {
        let venue_id = VenueId::new();
        let soup = item(venue_id, 500);

        for qty in [0, -3] {
            let lines = [
                OrderLineRequest::new(soup.id, 1),
                OrderLineRequest::new(soup.id, qty),
            ];
            match price_against(venue_id, &lines, &[soup.clone()]) {
                Err(PricingError::InvalidRequest(msg)) => assert!(msg.contains("items[1]"), "{msg}"),
                other => panic!("expected InvalidRequest, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_quantity_is_invalid() {
        let venue_id = VenueId::new();
        let soup = item(venue_id, 500);
        let lines = [OrderLineRequest {
            menu_item_id: soup.id,
            quantity: None,
        }];
        assert!(matches!(
            validate_request(&lines),
            Err(PricingError::InvalidRequest(msg)) if msg.contains("quantity is required")
        ));
    }

    #[test]
    fn prices_single_line_scenario() {
        let venue_id = VenueId::new();
        let soup = item(venue_id, 500);

        let priced = price_against(venue_id, &[OrderLineRequest::new(soup.id, 3)], &[soup.clone()])
            .unwrap();

        assert_eq!(priced.total_in_cents, 1500);
        assert_eq!(
            priced.lines,
            vec![PricedLine {
                menu_item_id: soup.id,
                quantity: 3,
                price_in_cents_at_order: 500,
            }]
        );
    }

    #[test]
    fn unknown_item_fails_whole_cart() {
        let venue_id = VenueId::new();
        let soup = item(venue_id, 500);
        let ghost = MenuItemId::new();

        let err = price_against(
            venue_id,
            &[OrderLineRequest::new(soup.id, 1), OrderLineRequest::new(ghost, 1)],
            &[soup],
        )
        .unwrap_err();
        assert_eq!(err, PricingError::ItemNotAvailable { menu_item_id: ghost });
    }

    #[test]
    fn item_from_another_venue_is_not_available() {
        let venue_id = VenueId::new();
        let foreign = item(VenueId::new(), 100);

        // Even if a misbehaving lookup returns it, the venue check holds.
        let err = price_against(venue_id, &[OrderLineRequest::new(foreign.id, 1)], &[foreign.clone()])
            .unwrap_err();
        assert_eq!(err, PricingError::ItemNotAvailable { menu_item_id: foreign.id });
    }

    #[test]
    fn duplicate_items_are_priced_as_separate_lines_in_request_order() {
        let venue_id = VenueId::new();
        let soup = item(venue_id, 500);
        let bread = item(venue_id, 150);
        let lines = [
            OrderLineRequest::new(bread.id, 2),
            OrderLineRequest::new(soup.id, 1),
            OrderLineRequest::new(bread.id, 1),
        ];

        assert_eq!(distinct_item_ids(&lines), vec![bread.id, soup.id]);

        let priced = price_against(venue_id, &lines, &[soup.clone(), bread.clone()]).unwrap();
        let ids: Vec<_> = priced.lines.iter().map(|l| l.menu_item_id).collect();
        assert_eq!(ids, vec![bread.id, soup.id, bread.id]);
        assert_eq!(priced.total_in_cents, 2 * 150 + 500 + 150);
    }

    #[test]
    fn overflow_is_rejected_not_wrapped() {
        let venue_id = VenueId::new();
        let caviar = item(venue_id, i64::MAX / 2 + 1);
        let err = price_against(venue_id, &[OrderLineRequest::new(caviar.id, 2)], &[caviar])
            .unwrap_err();
        assert_eq!(err, PricingError::InvalidRequest("order total overflows".to_string()));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the total is the exact integer sum of quantity × price.
        #[test]
        fn total_is_sum_of_quantity_times_price(
            cart in prop::collection::vec((0i64..100_000i64, 1i64..1_000i64), 1..20)
        ) {
            let venue_id = VenueId::new();
            let items: Vec<MenuItem> = cart.iter().map(|(price, _)| item(venue_id, *price)).collect();
            let lines: Vec<OrderLineRequest> = items
                .iter()
                .zip(cart.iter())
                .map(|(item, (_, qty))| OrderLineRequest::new(item.id, *qty))
                .collect();

            let priced = price_against(venue_id, &lines, &items).unwrap();
            let expected: i64 = cart.iter().map(|(price, qty)| price * qty).sum();

            prop_assert_eq!(priced.total_in_cents, expected);
            prop_assert_eq!(priced.lines.len(), lines.len());
        }
    }
}
