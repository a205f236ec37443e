//! Orders domain module.
//!
//! This crate contains business rules for diner orders, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage):
//! - pricing a requested cart against resolved menu items
//! - the order graph (order + price-snapshot lines)
//! - the status lifecycle

pub mod order;
pub mod pricing;
pub mod status;

pub use order::{Order, OrderDetails, OrderLine, OrderLineDetails};
pub use pricing::{
    OrderLineRequest, PricedLine, PricedOrder, PricingError, distinct_item_ids, price_against,
    validate_request,
};
pub use status::{OrderStatus, StatusError};
