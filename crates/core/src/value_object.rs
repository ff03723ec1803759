//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (two value objects with same values are equal)
/// - **Entity**: Has identity (two entities with same ID are the same entity)
///
/// Example:
/// - `Money(150_00)` is a value object
/// - `Client { id: ClientId(..), name: "..." }` is an entity
///
/// Line items on a repair order are value objects too: they carry a name/price
/// snapshot and have no identity outside the order that owns them.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
