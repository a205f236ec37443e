//! Postgres-backed order repository.
//!
//! Order graphs are read with two queries: one for the order rows (joined with
//! their venue and diner) and one batch query for all of their lines (joined
//! with menu items). Lines come back in the order they were placed.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use dineout_catalog::{DinerProfile, MenuItem, Venue};
use dineout_core::{MenuItemId, OrderId, OrderLineId, UserId, VenueId};
use dineout_ordering::{Order, OrderDetails, OrderLine, OrderStatus};

use super::{OrderRepository, OrderStatusContext};
use crate::catalog::postgres::decode;
use crate::error::{RepositoryError, map_sqlx_error};

const ORDER_SELECT: &str = r#"
    SELECT
        o.id, o.diner_id, o.venue_id, o.total_amount_in_cents, o.status,
        o.order_timestamp, o.created_at, o.updated_at,
        v.id AS venue_ref, v.merchant_id AS venue_merchant_id, v.name AS venue_name,
        u.id AS diner_ref, u.email AS diner_email
    FROM orders o
    LEFT JOIN venues v ON v.id = o.venue_id
    LEFT JOIN users u ON u.id = o.diner_id
"#;

/// Menu items are joined regardless of `deleted_at` so that history keeps
/// showing what was ordered.
const LINES_SELECT: &str = r#"
    SELECT
        oi.id, oi.order_id, oi.menu_item_id, oi.quantity, oi.price_in_cents_at_order,
        mi.id AS item_ref, mi.venue_id AS item_venue_id, mi.name AS item_name,
        mi.price_in_cents AS item_price_in_cents
    FROM order_items oi
    LEFT JOIN menu_items mi ON mi.id = oi.menu_item_id
    WHERE oi.order_id = ANY($1) AND oi.deleted_at IS NULL
    ORDER BY oi.order_id, oi.position
"#;

type JoinedLines = HashMap<OrderId, Vec<(OrderLine, Option<MenuItem>)>>;

#[derive(Debug, Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_lines(&self, order_ids: &[Uuid]) -> Result<JoinedLines, RepositoryError> {
        let mut grouped = JoinedLines::new();
        if order_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = sqlx::query(LINES_SELECT)
            .bind(order_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_order_lines", e))?;

        for row in &rows {
            let (line, item) = line_from_row(row)?;
            grouped.entry(line.order_id).or_default().push((line, item));
        }
        Ok(grouped)
    }

    async fn list_where(
        &self,
        operation: &str,
        filter_column: &str,
        filter_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        let sql = format!(
            "{ORDER_SELECT} WHERE o.{filter_column} = $1 AND o.deleted_at IS NULL \
             AND ($2::text IS NULL OR o.status = $2) \
             ORDER BY o.created_at DESC, o.id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(filter_id)
            .bind(status.as_ref().map(OrderStatus::as_str))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        let ids = rows
            .iter()
            .map(|row| decode::<Uuid>(row, "id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut lines = self.load_lines(&ids).await?;

        rows.iter()
            .map(|row| {
                let order = order_from_row(row)?;
                let joined = lines.remove(&order.id).unwrap_or_default();
                Ok(assemble(order, joined_venue(row)?, joined_diner(row)?, joined))
            })
            .collect()
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    #[instrument(
        skip(self, order),
        fields(order_id = %order.id, venue_id = %order.venue_id, lines = order.lines.len()),
        err
    )]
    async fn create_order_atomic(&self, order: &Order) -> Result<Order, RepositoryError> {
        // Dropping `tx` without commit rolls back, including on early return.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id,
                diner_id,
                venue_id,
                total_amount_in_cents,
                status,
                order_timestamp,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.diner_id.as_uuid())
        .bind(order.venue_id.as_uuid())
        .bind(order.total_amount_in_cents)
        .bind(order.status.as_str())
        .bind(order.order_timestamp)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for (position, line) in order.lines.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| RepositoryError::storage("too many order lines"))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id,
                    order_id,
                    position,
                    menu_item_id,
                    quantity,
                    price_in_cents_at_order,
                    created_at,
                    updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(position)
            .bind(line.menu_item_id.as_uuid())
            .bind(line.quantity)
            .bind(line.price_in_cents_at_order)
            .bind(order.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(order.clone())
    }

    #[instrument(skip(self), fields(order_id = %order_id), err)]
    async fn get_by_id(&self, order_id: OrderId) -> Result<Option<OrderDetails>, RepositoryError> {
        let sql = format!("{ORDER_SELECT} WHERE o.id = $1 AND o.deleted_at IS NULL");
        let Some(row) = sqlx::query(&sql)
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order_by_id", e))?
        else {
            return Ok(None);
        };

        let order = order_from_row(&row)?;
        let joined = self
            .load_lines(&[*order.id.as_uuid()])
            .await?
            .remove(&order.id)
            .unwrap_or_default();

        Ok(Some(assemble(order, joined_venue(&row)?, joined_diner(&row)?, joined)))
    }

    #[instrument(skip(self), fields(venue_id = %venue_id, status = ?status), err)]
    async fn list_by_venue(
        &self,
        venue_id: VenueId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        self.list_where("list_orders_by_venue", "venue_id", *venue_id.as_uuid(), status)
            .await
    }

    #[instrument(skip(self), fields(diner_id = %diner_id, status = ?status), err)]
    async fn list_by_diner(
        &self,
        diner_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        self.list_where("list_orders_by_diner", "diner_id", *diner_id.as_uuid(), status)
            .await
    }

    #[instrument(skip(self), fields(order_id = %order_id), err)]
    async fn find_status_context(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderStatusContext>, RepositoryError> {
        let Some(row) = sqlx::query(
            r#"
            SELECT
                o.id, o.diner_id, o.venue_id, o.total_amount_in_cents, o.status,
                o.order_timestamp, o.created_at, o.updated_at,
                v.merchant_id AS venue_merchant_id
            FROM orders o
            JOIN venues v ON v.id = o.venue_id
            WHERE o.id = $1 AND o.deleted_at IS NULL
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_order_status_context", e))?
        else {
            return Ok(None);
        };

        let mut order = order_from_row(&row)?;
        order.lines = self
            .load_lines(&[*order.id.as_uuid()])
            .await?
            .remove(&order.id)
            .unwrap_or_default()
            .into_iter()
            .map(|(line, _)| line)
            .collect();

        Ok(Some(OrderStatusContext {
            order,
            venue_owner_id: UserId::from_uuid(decode(&row, "venue_merchant_id")?),
        }))
    }

    #[instrument(skip(self), fields(order_id = %order_id, from = %expected, to = %next), err)]
    async fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_order_status", e))?;

        Ok(result.rows_affected() == 1)
    }
}

/// Order columns only; `lines` is left empty.
fn order_from_row(row: &PgRow) -> Result<Order, RepositoryError> {
    let status: String = decode(row, "status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| RepositoryError::decode(format!("column 'status': {e}")))?;

    Ok(Order {
        id: OrderId::from_uuid(decode(row, "id")?),
        diner_id: UserId::from_uuid(decode(row, "diner_id")?),
        venue_id: VenueId::from_uuid(decode(row, "venue_id")?),
        total_amount_in_cents: decode(row, "total_amount_in_cents")?,
        status,
        order_timestamp: decode(row, "order_timestamp")?,
        created_at: decode(row, "created_at")?,
        updated_at: decode(row, "updated_at")?,
        lines: Vec::new(),
    })
}

fn joined_venue(row: &PgRow) -> Result<Option<Venue>, RepositoryError> {
    let Some(id) = decode::<Option<Uuid>>(row, "venue_ref")? else {
        return Ok(None);
    };
    Ok(Some(Venue {
        id: VenueId::from_uuid(id),
        owner_merchant_id: UserId::from_uuid(decode(row, "venue_merchant_id")?),
        name: decode(row, "venue_name")?,
    }))
}

fn joined_diner(row: &PgRow) -> Result<Option<DinerProfile>, RepositoryError> {
    let Some(id) = decode::<Option<Uuid>>(row, "diner_ref")? else {
        return Ok(None);
    };
    Ok(Some(DinerProfile {
        id: UserId::from_uuid(id),
        email: decode(row, "diner_email")?,
    }))
}

fn line_from_row(row: &PgRow) -> Result<(OrderLine, Option<MenuItem>), RepositoryError> {
    let line = OrderLine {
        id: OrderLineId::from_uuid(decode(row, "id")?),
        order_id: OrderId::from_uuid(decode(row, "order_id")?),
        menu_item_id: MenuItemId::from_uuid(decode(row, "menu_item_id")?),
        quantity: decode(row, "quantity")?,
        price_in_cents_at_order: decode(row, "price_in_cents_at_order")?,
    };

    let item = match decode::<Option<Uuid>>(row, "item_ref")? {
        Some(id) => Some(MenuItem {
            id: MenuItemId::from_uuid(id),
            venue_id: VenueId::from_uuid(decode(row, "item_venue_id")?),
            name: decode(row, "item_name")?,
            price_in_cents: decode(row, "item_price_in_cents")?,
        }),
        None => None,
    };

    Ok((line, item))
}

fn assemble(
    mut order: Order,
    venue: Option<Venue>,
    diner: Option<DinerProfile>,
    joined: Vec<(OrderLine, Option<MenuItem>)>,
) -> OrderDetails {
    let mut menu = HashMap::new();
    order.lines = joined
        .into_iter()
        .map(|(line, item)| {
            if let Some(item) = item {
                menu.insert(item.id, item);
            }
            line
        })
        .collect();

    OrderDetails::assemble(order, venue, diner, |id| menu.get(id).cloned())
}
