use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    response::IntoResponse,
    routing::{get, put},
};

use dineout_auth::Principal;
use dineout_core::{OrderId, VenueId};
use dineout_infra::{OrderService, parse_status_filter};

use crate::app::{dto, errors, routes::system};

pub fn router() -> Router {
    Router::new()
        .route("/merchant", get(system::merchant_account))
        .route("/merchant/venues/:venue_id/orders", get(list_venue_orders))
        .route("/merchant/orders/:order_id", get(get_order))
        .route("/merchant/orders/:order_id/status", put(update_order_status))
}

pub async fn list_venue_orders(
    Extension(service): Extension<OrderService>,
    principal: Option<Extension<Principal>>,
    Path(venue_id): Path<String>,
    query: Result<Query<dto::StatusQuery>, QueryRejection>,
) -> axum::response::Response {
    let venue_id = match venue_id.parse::<VenueId>() {
        Ok(id) => id,
        Err(e) => return errors::invalid_id(e),
    };
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let status = match parse_status_filter(query.status.as_deref()) {
        Ok(status) => status,
        Err(e) => return errors::order_error_to_response(e),
    };

    let principal = principal.as_ref().map(|Extension(p)| p);
    match service.list_orders_for_venue(principal, venue_id, status).await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(service): Extension<OrderService>,
    principal: Option<Extension<Principal>>,
    Path(order_id): Path<String>,
) -> axum::response::Response {
    let order_id = match order_id.parse::<OrderId>() {
        Ok(id) => id,
        Err(e) => return errors::invalid_id(e),
    };

    let principal = principal.as_ref().map(|Extension(p)| p);
    match service.get_order_for_merchant(principal, order_id).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(service): Extension<OrderService>,
    principal: Option<Extension<Principal>>,
    Path(order_id): Path<String>,
    payload: Result<Json<dto::UpdateOrderStatusRequest>, JsonRejection>,
) -> axum::response::Response {
    let order_id = match order_id.parse::<OrderId>() {
        Ok(id) => id,
        Err(e) => return errors::invalid_id(e),
    };
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let principal = principal.as_ref().map(|Extension(p)| p);
    match service.update_status(principal, order_id, &body.status).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}
