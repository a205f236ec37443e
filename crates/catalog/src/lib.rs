//! Catalog read model (venues, menu items, diner profiles).
//!
//! The catalog is owned by other services; the ordering core only reads it.
//! These are plain values with no IO.

pub mod menu_item;
pub mod profile;
pub mod venue;

pub use menu_item::MenuItem;
pub use profile::DinerProfile;
pub use venue::Venue;
