//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per actor)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use dineout_auth::{Hs256JwtValidator, JwtValidator};
use dineout_infra::{
    InMemoryStore, OrderService, PostgresCatalogGateway, PostgresOrderRepository, db,
};

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the router around an already-wired service.
pub fn build_router(service: OrderService, jwt: Arc<dyn JwtValidator>, cors: CorsLayer) -> Router {
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require an authenticated principal.
    let protected = routes::router()
        .layer(Extension(service))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(cors))
}

/// Router backed by `store`, for dev servers and tests that seed data.
/// Any origin is allowed.
pub fn build_in_memory_app(store: Arc<InMemoryStore>, jwt_secret: &str, jwt_issuer: &str) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::with_issuer(
        jwt_secret.as_bytes().to_vec(),
        jwt_issuer,
    ));
    build_router(OrderService::in_memory(store), jwt, middleware::cors_layer(&[]))
}

/// Build the full HTTP router from configuration (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
        let jwt = Arc::new(Hs256JwtValidator::with_issuer(
            config.jwt_secret.as_bytes().to_vec(),
            &config.jwt_issuer,
        ));
        return Ok(build_router(
            OrderService::in_memory(Arc::new(InMemoryStore::new())),
            jwt,
            middleware::cors_layer(&config.cors_allowed_origins),
        ));
    };

    let pool = db::connect(database_url, config.db_max_connections).await?;
    db::migrate(&pool).await?;
    info!("database migrations applied");

    let service = OrderService::new(
        Arc::new(PostgresCatalogGateway::new(pool.clone())),
        Arc::new(PostgresOrderRepository::new(pool)),
    );
    let jwt = Arc::new(Hs256JwtValidator::with_issuer(
        config.jwt_secret.as_bytes().to_vec(),
        &config.jwt_issuer,
    ));

    Ok(build_router(
        service,
        jwt,
        middleware::cors_layer(&config.cors_allowed_origins),
    ))
}
