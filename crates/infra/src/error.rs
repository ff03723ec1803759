//! Error types for the record store and the engine components.
//!
//! Every expected outcome (missing record, short stock, rejected input) has
//! its own variant so callers can branch on it without string matching.

use servicepro_catalog::ServiceId;
use servicepro_clients::ClientId;
use servicepro_core::DomainError;
use servicepro_inventory::PartId;
use servicepro_orders::OrderId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate id {id} in collection {collection}")]
    DuplicateId { collection: &'static str, id: u64 },

    #[error("collection {collection} does not hold records of type {record_type}")]
    RecordTypeMismatch {
        collection: &'static str,
        record_type: &'static str,
    },

    #[error("phone {phone} is on file for both client {first} and client {second}")]
    SharedPhone {
        phone: String,
        first: ClientId,
        second: ClientId,
    },

    #[error("store lock poisoned")]
    Poisoned,

    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client not found: {0}")]
    NotFound(ClientId),

    #[error("phone {phone} already belongs to client {owner}")]
    PhoneTaken { phone: String, owner: ClientId },

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum StockError {
    #[error("part not found: {0}")]
    PartNotFound(PartId),

    #[error("insufficient stock for part {part_id}: requested {requested}, available {available}")]
    InsufficientStock {
        part_id: PartId,
        requested: u32,
        available: u32,
    },

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("service not found: {0}")]
    NotFound(ServiceId),

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("part not found: {0}")]
    PartNotFound(PartId),

    #[error("service not found: {0}")]
    ServiceNotFound(ServiceId),

    #[error("insufficient stock for part {part_id}: requested {requested}, available {available}")]
    InsufficientStock {
        part_id: PartId,
        requested: u32,
        available: u32,
    },

    #[error("order {0} was already issued")]
    AlreadyIssued(OrderId),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<StockError> for OrderError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::PartNotFound(id) => OrderError::PartNotFound(id),
            StockError::InsufficientStock {
                part_id,
                requested,
                available,
            } => OrderError::InsufficientStock {
                part_id,
                requested,
                available,
            },
            StockError::Invalid(e) => OrderError::Invalid(e),
            StockError::Ledger(e) => OrderError::Ledger(e),
            StockError::Store(e) => OrderError::Store(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures while opening or seeding a workshop.
#[derive(Debug, thiserror::Error)]
pub enum WorkshopError {
    #[error("invalid demo data: {0}")]
    Seed(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_errors_keep_their_kind_inside_order_errors() {
        let short = StockError::InsufficientStock {
            part_id: PartId::new(1),
            requested: 4,
            available: 3,
        };
        assert!(matches!(
            OrderError::from(short),
            OrderError::InsufficientStock { requested: 4, available: 3, .. }
        ));
        assert!(matches!(
            OrderError::from(StockError::PartNotFound(PartId::new(9))),
            OrderError::PartNotFound(_)
        ));
    }
}
