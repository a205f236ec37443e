//! Order Repository: atomic persistence and joined retrieval of order graphs.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dineout_core::{OrderId, UserId, VenueId};
use dineout_ordering::{Order, OrderDetails, OrderStatus};

use crate::error::RepositoryError;

pub use postgres::PostgresOrderRepository;

/// What a status update needs to know about an order: the order itself and
/// who owns its venue (resolved with a join).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusContext {
    pub order: Order,
    pub venue_owner_id: UserId,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist the order row and all of its line rows in one transaction.
    ///
    /// Either every row is written or none is.
    async fn create_order_atomic(&self, order: &Order) -> Result<Order, RepositoryError>;

    /// Order graph with lines (and their menu items), venue and diner.
    async fn get_by_id(&self, order_id: OrderId) -> Result<Option<OrderDetails>, RepositoryError>;

    /// Most recent first. Empty when nothing matches.
    async fn list_by_venue(
        &self,
        venue_id: VenueId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, RepositoryError>;

    /// Most recent first. Empty when nothing matches.
    async fn list_by_diner(
        &self,
        diner_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, RepositoryError>;

    async fn find_status_context(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderStatusContext>, RepositoryError>;

    /// Single-row compare-and-set on `status`.
    ///
    /// Returns `false` when the order is gone or no longer in `expected`.
    async fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
}
