//! Service catalog: the repair work a shop offers and its list prices.
//!
//! Orders copy a service's name and price when it is added, so editing or
//! deleting a catalog entry never rewrites order history.

pub mod service;

pub use service::{PriceStats, Service, ServiceDetails, ServiceId};
