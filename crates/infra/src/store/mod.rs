//! Record store: keyed collections with store-assigned ids, plus the JSON
//! snapshot they persist to.

pub mod in_memory;
pub mod record;
pub mod snapshot;

pub use in_memory::InMemoryRecordStore;
pub use record::{Collection, Record, RecordStore};
pub use snapshot::Snapshot;
