//! Order Pricing Engine: validation, one venue-scoped catalog lookup, pricing.

use std::sync::Arc;

use tracing::instrument;

use dineout_core::VenueId;
use dineout_ordering::{OrderLineRequest, PricedOrder, distinct_item_ids, price_against, validate_request};

use crate::catalog::CatalogGateway;
use crate::service::OrderServiceError;

#[derive(Clone)]
pub struct PricingEngine {
    catalog: Arc<dyn CatalogGateway>,
}

impl PricingEngine {
    pub fn new(catalog: Arc<dyn CatalogGateway>) -> Self {
        Self { catalog }
    }

    /// Price a cart against `venue_id`'s live menu.
    ///
    /// Invalid carts are rejected before the catalog is touched.
    #[instrument(skip(self, lines), fields(venue_id = %venue_id, lines = lines.len()), err)]
    pub async fn price_order(
        &self,
        venue_id: VenueId,
        lines: &[OrderLineRequest],
    ) -> Result<PricedOrder, OrderServiceError> {
        validate_request(lines)?;

        let ids = distinct_item_ids(lines);
        let resolved = self.catalog.menu_items_for_venue(venue_id, &ids).await?;

        Ok(price_against(venue_id, lines, &resolved)?)
    }
}
