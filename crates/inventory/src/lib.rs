//! Inventory domain module.
//!
//! Stock quantity and weighted-average unit cost per part, implemented as
//! deterministic domain logic (no IO, no storage). Cash effects of purchases
//! are recorded by the coordinator in `servicepro-infra`.

pub mod part;

pub use part::{InventoryPart, LOW_STOCK_THRESHOLD, NewPart, PartDetails, PartId};
