//! The four engine components.
//!
//! Each component borrows the record store for the duration of one operation.
//! Components that move stock or money build the ones they depend on, so a
//! compound operation runs against a single store borrow; `Workshop` wraps
//! that borrow in its lock.

pub mod cash;
pub mod catalog;
pub mod clients;
pub mod inventory;
pub mod orders;

pub use cash::CashLedger;
pub use catalog::ServiceCatalog;
pub use clients::ClientRegistry;
pub use inventory::{InventoryLedger, InventoryStats, StockReceipt, SupplyLine, SupplyReceipt};
pub use orders::{IssueReceipt, OrderEngine};
