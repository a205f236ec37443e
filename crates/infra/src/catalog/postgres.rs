//! Postgres-backed catalog gateway.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use dineout_catalog::{MenuItem, Venue};
use dineout_core::{MenuItemId, UserId, VenueId};

use super::CatalogGateway;
use crate::error::{RepositoryError, map_sqlx_error};

/// Reads the `venues` and `menu_items` tables.
///
/// Every menu item query carries `venue_id` in the WHERE clause, so an item id
/// from another venue can never be priced into an order.
#[derive(Debug, Clone)]
pub struct PostgresCatalogGateway {
    pool: PgPool,
}

impl PostgresCatalogGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogGateway for PostgresCatalogGateway {
    #[instrument(skip(self), fields(venue_id = %venue_id), err)]
    async fn find_venue(&self, venue_id: VenueId) -> Result<Option<Venue>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, merchant_id, name
            FROM venues
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(venue_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_venue", e))?;

        row.as_ref().map(venue_from_row).transpose()
    }

    #[instrument(skip(self, ids), fields(venue_id = %venue_id, requested = ids.len()), err)]
    async fn menu_items_for_venue(
        &self,
        venue_id: VenueId,
        ids: &[MenuItemId],
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, venue_id, name, price_in_cents
            FROM menu_items
            WHERE id = ANY($1) AND venue_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(&ids)
        .bind(venue_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("menu_items_for_venue", e))?;

        rows.iter().map(menu_item_from_row).collect()
    }
}

pub(crate) fn venue_from_row(row: &PgRow) -> Result<Venue, RepositoryError> {
    Ok(Venue {
        id: VenueId::from_uuid(decode(row, "id")?),
        owner_merchant_id: UserId::from_uuid(decode(row, "merchant_id")?),
        name: decode(row, "name")?,
    })
}

pub(crate) fn menu_item_from_row(row: &PgRow) -> Result<MenuItem, RepositoryError> {
    Ok(MenuItem {
        id: MenuItemId::from_uuid(decode(row, "id")?),
        venue_id: VenueId::from_uuid(decode(row, "venue_id")?),
        name: decode(row, "name")?,
        price_in_cents: decode(row, "price_in_cents")?,
    })
}

pub(crate) fn decode<'r, T>(row: &'r PgRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| RepositoryError::decode(format!("column '{column}': {e}")))
}
