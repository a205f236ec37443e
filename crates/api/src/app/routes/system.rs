use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use dineout_auth::{Principal, Role, require_role};

use crate::app::{dto::AccountResponse, errors};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn diner_account(principal: Option<Extension<Principal>>) -> axum::response::Response {
    account(principal, Role::Diner)
}

pub async fn merchant_account(principal: Option<Extension<Principal>>) -> axum::response::Response {
    account(principal, Role::Merchant)
}

fn account(principal: Option<Extension<Principal>>, role: Role) -> axum::response::Response {
    let Some(Extension(principal)) = principal else {
        return errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required");
    };
    match require_role(&principal, role) {
        Ok(()) => Json(AccountResponse::from(&principal)).into_response(),
        Err(e) => errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
    }
}
