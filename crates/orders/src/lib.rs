//! Repair order domain module.
//!
//! Business rules for repair orders, implemented purely as deterministic
//! domain logic (no IO, no storage, no clock). Stock and cash side effects of
//! order operations are coordinated in `servicepro-infra`.

pub mod event;
pub mod intake;
pub mod number;
pub mod order;

pub use event::{OrderEvent, OrderIssued, OrderReady};
pub use intake::{IntakeForm, OrderIntake};
pub use number::generate_number;
pub use order::{
    Device, OrderId, OrderStatus, OrderSummary, PartLine, Priority, RepairOrder, ServiceLine,
};
