use axum::Router;

pub mod diner;
pub mod merchant;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new().merge(diner::router()).merge(merchant::router())
}
