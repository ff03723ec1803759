//! Infrastructure layer: record store, snapshot, config, clock and the
//! engine components coordinated by [`Workshop`].

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod seed;
pub mod store;
pub mod workshop;


pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use error::{
    CatalogError, ClientError, LedgerError, OrderError, StockError, StoreError, StoreResult,
    WorkshopError,
};
pub use workshop::{Dashboard, Workshop};
