//! Infrastructure layer: catalog and order stores, pricing, and the order
//! lifecycle service.

pub mod catalog;
pub mod db;
pub mod error;
pub mod memory;
pub mod orders;
pub mod pricing;
pub mod service;

pub use catalog::{CatalogGateway, PostgresCatalogGateway};
pub use error::RepositoryError;
pub use memory::{Fault, InMemoryStore};
pub use orders::{OrderRepository, OrderStatusContext, PostgresOrderRepository};
pub use pricing::PricingEngine;
pub use service::{OrderService, OrderServiceError, parse_status_filter};
