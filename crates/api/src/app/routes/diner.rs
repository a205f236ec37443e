use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use dineout_auth::{Principal, can_place_order};
use dineout_core::OrderId;
use dineout_infra::{OrderService, parse_status_filter};

use crate::app::{dto, errors, routes::system};

pub fn router() -> Router {
    Router::new()
        .route("/diner", get(system::diner_account))
        .route("/diner/orders", post(place_order).get(list_orders))
        .route("/diner/orders/:order_id", get(get_order))
}

pub async fn place_order(
    Extension(service): Extension<OrderService>,
    principal: Option<Extension<Principal>>,
    payload: Result<Json<dto::PlaceOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    // Role is checked before the body is looked at.
    if let Some(Extension(p)) = &principal {
        if let Err(e) = can_place_order(p) {
            return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
        }
    }
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let principal = principal.as_ref().map(|Extension(p)| p);
    match service.place_order(principal, body.venue_id, &body.lines()).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(service): Extension<OrderService>,
    principal: Option<Extension<Principal>>,
    query: Result<Query<dto::StatusQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let status = match parse_status_filter(query.status.as_deref()) {
        Ok(status) => status,
        Err(e) => return errors::order_error_to_response(e),
    };

    let principal = principal.as_ref().map(|Extension(p)| p);
    match service.list_orders_for_diner(principal, status).await {
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
    match service.get_order_for_diner(principal, order_id).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}
