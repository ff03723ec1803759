use servicepro_catalog::Service;
use servicepro_clients::Client;
use servicepro_core::{Entity, RecordId};
use servicepro_finance::Transaction;
use servicepro_inventory::InventoryPart;
use servicepro_orders::RepairOrder;

use crate::error::{StoreError, StoreResult};
use crate::store::snapshot::Snapshot;

/// The keyed collections the engine persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    Orders,
    Inventory,
    Services,
    Transactions,
}

impl Collection {
    /// Name of the top-level array in the snapshot document.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Clients => "clients",
            Collection::Orders => "orders",
            Collection::Inventory => "inventory",
            Collection::Services => "services",
            Collection::Transactions => "transactions",
        }
    }
}

/// A domain type stored in one of the engine's collections.
///
/// Only the collection tag and id conversion are required; how rows are laid
/// out is up to each [`RecordStore`].
pub trait Record: Entity<Id: Into<RecordId> + From<RecordId>> + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;
}

pub(crate) fn raw_id<R: Record>(id: R::Id) -> u64 {
    let raw: RecordId = id.into();
    raw.get()
}

pub(crate) fn duplicate<R: Record>(id: u64) -> StoreError {
    StoreError::DuplicateId {
        collection: R::COLLECTION.as_str(),
        id,
    }
}

impl Record for Client {
    const COLLECTION: Collection = Collection::Clients;
}

impl Record for RepairOrder {
    const COLLECTION: Collection = Collection::Orders;
}

impl Record for InventoryPart {
    const COLLECTION: Collection = Collection::Inventory;
}

impl Record for Service {
    const COLLECTION: Collection = Collection::Services;
}

impl Record for Transaction {
    const COLLECTION: Collection = Collection::Transactions;
}

/// Generic keyed-collection CRUD with store-assigned identity.
///
/// Ids are allocated per collection, increase monotonically and are never
/// handed out twice by the same store. Implementations do not lock; callers
/// serialize access (see `Workshop`).
pub trait RecordStore: Send {
    /// Allocate the next id for `R` and store what `build` returns. Nothing is
    /// stored, and no id is consumed, when `build` fails.
    fn create<R, E>(&mut self, build: impl FnOnce(R::Id) -> Result<R, E>) -> Result<R, E>
    where
        R: Record,
        E: From<StoreError>;

    /// Apply `change` to the stored record. The record is left untouched when
    /// `change` fails. `Ok(None)` when there is no record with `id`.
    fn try_update<R, E>(
        &mut self,
        id: R::Id,
        change: impl FnOnce(&mut R) -> Result<(), E>,
    ) -> Result<Option<R>, E>
    where
        R: Record,
        E: From<StoreError>;

    fn update<R: Record>(&mut self, id: R::Id, change: impl FnOnce(&mut R)) -> StoreResult<Option<R>> {
        self.try_update::<R, StoreError>(id, |record| {
            change(record);
            Ok(())
        })
    }

    /// Remove and return the record, if present.
    fn delete<R: Record>(&mut self, id: R::Id) -> StoreResult<Option<R>>;

    fn find<R: Record>(&self, id: R::Id) -> StoreResult<Option<R>>;

    /// Records matching `predicate`, in id order.
    fn find_all_by<R: Record>(&self, predicate: impl Fn(&R) -> bool) -> StoreResult<Vec<R>>;

    /// Every record of the collection, in id order.
    fn query_all<R: Record>(&self) -> StoreResult<Vec<R>> {
        self.find_all_by::<R>(|_| true)
    }

    fn count<R: Record>(&self) -> StoreResult<usize>;

    /// Copy of the whole store as a snapshot document.
    fn snapshot(&self) -> StoreResult<Snapshot> {
        Ok(Snapshot {
            clients: self.query_all::<Client>()?,
            orders: self.query_all::<RepairOrder>()?,
            inventory: self.query_all::<InventoryPart>()?,
            services: self.query_all::<Service>()?,
            transactions: self.query_all::<Transaction>()?,
        })
    }
}
