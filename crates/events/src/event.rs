use chrono::{DateTime, Utc};

/// A notification raised by the engine after a state change, such as an
/// order becoming ready for pickup.
///
/// Notifications describe something that already happened and was committed
/// to the record store. Nobody waits on their delivery.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted notification name, e.g. "orders.order.ready".
    fn event_type(&self) -> &'static str;

    /// Payload layout version, bumped when fields change meaning.
    fn version(&self) -> u32;

    /// Engine clock reading at the moment of the state change.
    fn occurred_at(&self) -> DateTime<Utc>;
}
