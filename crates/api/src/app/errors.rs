use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use dineout_core::DomainError;
use dineout_infra::OrderServiceError;

pub fn order_error_to_response(err: OrderServiceError) -> axum::response::Response {
    match err {
        OrderServiceError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
        }
        OrderServiceError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        OrderServiceError::InvalidRequest(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_request", msg)
        }
        e @ OrderServiceError::ItemNotAvailable(_) => {
            json_error(StatusCode::BAD_REQUEST, "item_not_available", e.to_string())
        }
        e @ OrderServiceError::VenueNotFound => {
            json_error(StatusCode::NOT_FOUND, "venue_not_found", e.to_string())
        }
        e @ OrderServiceError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        e @ OrderServiceError::InvalidStatus(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_status", e.to_string())
        }
        e @ OrderServiceError::InvalidTransition { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition", e.to_string())
        }
        OrderServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        OrderServiceError::Internal(e) => {
            // Store details stay in the logs.
            error!(error = %e, "order store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
    }
}

pub fn invalid_id(err: DomainError) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", err.to_string())
}

pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
