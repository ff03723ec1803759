//! Tracing and logging setup shared by every binary.

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use crate::tracing::{init, init_with_default};
