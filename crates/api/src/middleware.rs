use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{
        HeaderValue, Method, StatusCode,
        header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, ORIGIN},
    },
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::debug;

use dineout_auth::{AuthError, JwtValidator, authenticate};

use crate::app::errors;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Authenticate the bearer token and attach the caller's `Principal` as a
/// request extension.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let header = match req.headers().get(AUTHORIZATION).map(|v| v.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => return unauthenticated(AuthError::MalformedHeader),
    };

    let principal = match authenticate(state.jwt.as_ref(), header, Utc::now()) {
        Ok(principal) => principal,
        Err(e) => return unauthenticated(e),
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}

fn unauthenticated(err: AuthError) -> Response {
    // The reason is not returned to the client.
    debug!(error = %err, "rejected credential");
    errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
}

/// Cross-origin policy for browser clients. An empty list allows any origin.
///
/// Answers preflight requests itself, so they never reach `auth_middleware`.
pub fn cors_layer(allowed_origins: &[HeaderValue]) -> CorsLayer {
    let origins = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().cloned())
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([ORIGIN, CONTENT_TYPE, ACCEPT, AUTHORIZATION])
        .expose_headers([CONTENT_LENGTH])
        .max_age(Duration::from_secs(12 * 60 * 60))
}
