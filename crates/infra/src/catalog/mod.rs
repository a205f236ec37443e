//! Catalog Gateway: read-only lookups of venues and menu items.

pub mod postgres;

use async_trait::async_trait;

use dineout_catalog::{MenuItem, Venue};
use dineout_core::{MenuItemId, VenueId};

use crate::error::RepositoryError;

pub use postgres::PostgresCatalogGateway;

#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Live (not soft-deleted) venue by id.
    async fn find_venue(&self, venue_id: VenueId) -> Result<Option<Venue>, RepositoryError>;

    /// Live menu items among `ids` that belong to `venue_id`, in one lookup.
    ///
    /// Ids that are unknown, soft-deleted, or owned by another venue are
    /// simply absent from the result.
    async fn menu_items_for_venue(
        &self,
        venue_id: VenueId,
        ids: &[MenuItemId],
    ) -> Result<Vec<MenuItem>, RepositoryError>;
}
