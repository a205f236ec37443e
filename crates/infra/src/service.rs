//! Order Lifecycle Controller.
//!
//! Entry points for every order use case. Each call runs its policy checks
//! and validation before touching the repository, so a rejected call never
//! leaves partial state behind.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use dineout_auth::{
    AuthzError, Principal, Role, authorize, can_manage_venue, can_place_order,
    can_view_order_as_diner, can_view_order_as_merchant, require_role,
};
use dineout_core::{MenuItemId, OrderId, VenueId};
use dineout_ordering::{Order, OrderDetails, OrderLineRequest, OrderStatus, PricingError, StatusError};

use crate::catalog::CatalogGateway;
use crate::error::RepositoryError;
use crate::memory::InMemoryStore;
use crate::orders::OrderRepository;
use crate::pricing::PricingEngine;

#[derive(Debug, Error)]
pub enum OrderServiceError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("menu item {0} is not available at this venue")]
    ItemNotAvailable(MenuItemId),

    #[error("venue not found")]
    VenueNotFound,

    #[error("order not found")]
    NotFound,

    #[error("invalid status value '{0}'")]
    InvalidStatus(String),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order changed between read and conditional write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] RepositoryError),
}

impl From<AuthzError> for OrderServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated => Self::Unauthenticated,
            AuthzError::Forbidden(reason) => Self::Forbidden(reason),
        }
    }
}

impl From<PricingError> for OrderServiceError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InvalidRequest(msg) => Self::InvalidRequest(msg),
            PricingError::ItemNotAvailable { menu_item_id } => Self::ItemNotAvailable(menu_item_id),
        }
    }
}

impl From<StatusError> for OrderServiceError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::Unknown(value) => Self::InvalidStatus(value),
            StatusError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
        }
    }
}

/// Parse an optional `status` query filter. Empty means "no filter".
pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<OrderStatus>, OrderServiceError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => Ok(Some(value.parse::<OrderStatus>()?)),
    }
}

fn authorized<'p, F>(
    principal: Option<&'p Principal>,
    check: F,
) -> Result<&'p Principal, OrderServiceError>
where
    F: FnOnce(&Principal) -> Result<(), AuthzError>,
{
    authorize(principal, check)?;
    principal.ok_or(OrderServiceError::Unauthenticated)
}

#[derive(Clone)]
pub struct OrderService {
    catalog: Arc<dyn CatalogGateway>,
    orders: Arc<dyn OrderRepository>,
    pricing: PricingEngine,
}

impl OrderService {
    pub fn new(catalog: Arc<dyn CatalogGateway>, orders: Arc<dyn OrderRepository>) -> Self {
        Self {
            pricing: PricingEngine::new(catalog.clone()),
            catalog,
            orders,
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self::new(store.clone(), store)
    }

    /// Place a `Pending` order for the calling diner.
    #[instrument(
        skip(self, principal, lines),
        fields(user_id = ?principal.map(|p| p.user_id), venue_id = %venue_id, lines = lines.len()),
        err
    )]
    pub async fn place_order(
        &self,
        principal: Option<&Principal>,
        venue_id: VenueId,
        lines: &[OrderLineRequest],
    ) -> Result<OrderDetails, OrderServiceError> {
        let diner = authorized(principal, can_place_order)?;

        let venue = self
            .catalog
            .find_venue(venue_id)
            .await?
            .ok_or(OrderServiceError::VenueNotFound)?;

        let priced = self.pricing.price_order(venue.id, lines).await?;
        let order = Order::place(diner.user_id, priced, Utc::now());
        debug_assert!(order.is_consistent());
        let order = self.orders.create_order_atomic(&order).await?;

        info!(
            order_id = %order.id,
            total_amount_in_cents = order.total_amount_in_cents,
            "order placed"
        );
        Ok(self.reassemble(order).await)
    }

    #[instrument(skip(self, principal), fields(user_id = ?principal.map(|p| p.user_id)), err)]
    pub async fn list_orders_for_diner(
        &self,
        principal: Option<&Principal>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, OrderServiceError> {
        let diner = authorized(principal, |p| require_role(p, Role::Diner))?;
        Ok(self.orders.list_by_diner(diner.user_id, status).await?)
    }

    #[instrument(skip(self, principal), fields(user_id = ?principal.map(|p| p.user_id)), err)]
    pub async fn get_order_for_diner(
        &self,
        principal: Option<&Principal>,
        order_id: OrderId,
    ) -> Result<OrderDetails, OrderServiceError> {
        let diner = authorized(principal, |p| require_role(p, Role::Diner))?;

        let details = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(OrderServiceError::NotFound)?;
        can_view_order_as_diner(diner, &details)?;
        Ok(details)
    }

    #[instrument(skip(self, principal), fields(user_id = ?principal.map(|p| p.user_id)), err)]
    pub async fn list_orders_for_venue(
        &self,
        principal: Option<&Principal>,
        venue_id: VenueId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, OrderServiceError> {
        let merchant = authorized(principal, |p| require_role(p, Role::Merchant))?;

        let venue = self
            .catalog
            .find_venue(venue_id)
            .await?
            .ok_or(OrderServiceError::VenueNotFound)?;
        can_manage_venue(merchant, &venue)?;

        Ok(self.orders.list_by_venue(venue.id, status).await?)
    }

    #[instrument(skip(self, principal), fields(user_id = ?principal.map(|p| p.user_id)), err)]
    pub async fn get_order_for_merchant(
        &self,
        principal: Option<&Principal>,
        order_id: OrderId,
    ) -> Result<OrderDetails, OrderServiceError> {
        let merchant = authorized(principal, |p| require_role(p, Role::Merchant))?;

        let ctx = self
            .orders
            .find_status_context(order_id)
            .await?
            .ok_or(OrderServiceError::NotFound)?;
        can_view_order_as_merchant(merchant, ctx.venue_owner_id)?;

        self.orders
            .get_by_id(order_id)
            .await?
            .ok_or(OrderServiceError::NotFound)
    }

    /// Move an order along the lifecycle on behalf of the venue's owner.
    ///
    /// The write only succeeds if the order is still in the status the
    /// transition was validated against; otherwise `Conflict`.
    #[instrument(
        skip(self, principal),
        fields(user_id = ?principal.map(|p| p.user_id), order_id = %order_id),
        err
    )]
    pub async fn update_status(
        &self,
        principal: Option<&Principal>,
        order_id: OrderId,
        requested: &str,
    ) -> Result<OrderDetails, OrderServiceError> {
        let principal = principal.ok_or(OrderServiceError::Unauthenticated)?;
        let next = requested.parse::<OrderStatus>()?;
        require_role(principal, Role::Merchant)?;

        let ctx = self
            .orders
            .find_status_context(order_id)
            .await?
            .ok_or(OrderServiceError::NotFound)?;
        can_view_order_as_merchant(principal, ctx.venue_owner_id)?;

        let from = ctx.order.status;
        from.transition(next)?;

        let now = Utc::now();
        if !self.orders.update_status(order_id, from, next, now).await? {
            return Err(OrderServiceError::Conflict(format!(
                "order {order_id} is no longer {from}"
            )));
        }

        info!(
            order_id = %order_id,
            from = %from,
            to = %next,
            terminal = next.is_terminal(),
            "order status updated"
        );

        let mut order = ctx.order;
        order.status = next;
        order.updated_at = now;
        Ok(self.reassemble(order).await)
    }

    /// Re-read a committed order with its joins, falling back to the bare
    /// order when the read fails. The write is not undone either way.
    async fn reassemble(&self, order: Order) -> OrderDetails {
        match self.orders.get_by_id(order.id).await {
            Ok(Some(details)) => details,
            Ok(None) => {
                warn!(order_id = %order.id, "committed order not found on re-read");
                OrderDetails::minimal(order)
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "failed to re-read committed order");
                OrderDetails::minimal(order)
            }
        }
    }
}
