//! Outbound event plumbing.
//!
//! Domain crates define their own event enums and implement [`Event`]; the
//! engine publishes them through an [`EventBus`]. Delivery (toast, SMS
//! gateway, log line) is the subscriber's business.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
