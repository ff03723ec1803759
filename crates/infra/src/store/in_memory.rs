use std::any::Any;
use std::collections::{BTreeMap, HashMap};

use servicepro_catalog::Service;
use servicepro_clients::{Client, ClientId, normalize_phone};
use servicepro_core::{Entity, RecordId};
use servicepro_finance::Transaction;
use servicepro_inventory::InventoryPart;
use servicepro_orders::RepairOrder;

use crate::error::{StoreError, StoreResult};
use crate::store::record::{Collection, Record, RecordStore, duplicate, raw_id};
use crate::store::snapshot::Snapshot;

/// One collection: rows keyed by id plus the next id to hand out.
#[derive(Debug, Clone)]
struct Table<R> {
    rows: BTreeMap<u64, R>,
    next_id: u64,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<R: Record> Table<R> {
    fn insert_loaded(&mut self, record: R) -> StoreResult<()> {
        let id = raw_id::<R>(record.id());
        if self.rows.contains_key(&id) {
            return Err(duplicate::<R>(id));
        }
        self.next_id = self.next_id.max(id + 1);
        self.rows.insert(id, record);
        Ok(())
    }

    fn load(&mut self, records: Vec<R>) -> StoreResult<()> {
        records.into_iter().try_for_each(|r| self.insert_loaded(r))
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    clients: Table<Client>,
    orders: Table<RepairOrder>,
    inventory: Table<InventoryPart>,
    services: Table<Service>,
    transactions: Table<Transaction>,
}

impl Tables {
    fn slot(&self, collection: Collection) -> &dyn Any {
        match collection {
            Collection::Clients => &self.clients,
            Collection::Orders => &self.orders,
            Collection::Inventory => &self.inventory,
            Collection::Services => &self.services,
            Collection::Transactions => &self.transactions,
        }
    }

    fn slot_mut(&mut self, collection: Collection) -> &mut dyn Any {
        match collection {
            Collection::Clients => &mut self.clients,
            Collection::Orders => &mut self.orders,
            Collection::Inventory => &mut self.inventory,
            Collection::Services => &mut self.services,
            Collection::Transactions => &mut self.transactions,
        }
    }

    /// The table for `R`, or an error when `R` claims a collection that holds
    /// another record type.
    fn get<R: Record>(&self) -> StoreResult<&Table<R>> {
        self.slot(R::COLLECTION)
            .downcast_ref::<Table<R>>()
            .ok_or_else(mismatch::<R>)
    }

    fn get_mut<R: Record>(&mut self) -> StoreResult<&mut Table<R>> {
        self.slot_mut(R::COLLECTION)
            .downcast_mut::<Table<R>>()
            .ok_or_else(mismatch::<R>)
    }
}

fn mismatch<R: Record>() -> StoreError {
    StoreError::RecordTypeMismatch {
        collection: R::COLLECTION.as_str(),
        record_type: std::any::type_name::<R>(),
    }
}

/// In-memory record store for tests/dev and for snapshot-backed workshops.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    tables: Tables,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot. Id counters resume after the highest
    /// id found in each collection. Two clients holding the same normalized
    /// phone number make the snapshot invalid.
    pub fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        ensure_phones_unique(&snapshot.clients)?;
        let mut tables = Tables::default();
        tables.clients.load(snapshot.clients)?;
        tables.orders.load(snapshot.orders)?;
        tables.inventory.load(snapshot.inventory)?;
        tables.services.load(snapshot.services)?;
        tables.transactions.load(snapshot.transactions)?;
        Ok(Self { tables })
    }

    pub fn is_empty(&self) -> bool {
        self.tables.clients.rows.is_empty()
            && self.tables.orders.rows.is_empty()
            && self.tables.inventory.rows.is_empty()
            && self.tables.services.rows.is_empty()
            && self.tables.transactions.rows.is_empty()
    }
}

fn ensure_phones_unique(clients: &[Client]) -> StoreResult<()> {
    let mut owners: HashMap<String, ClientId> = HashMap::new();
    for client in clients {
        for phone in client.phones().iter() {
            let key = normalize_phone(phone);
            match owners.get(&key) {
                Some(&owner) if owner != client.id() => {
                    return Err(StoreError::SharedPhone {
                        phone: phone.to_string(),
                        first: owner,
                        second: client.id(),
                    });
                }
                Some(_) => {}
                None => {
                    owners.insert(key, client.id());
                }
            }
        }
    }
    Ok(())
}

impl RecordStore for InMemoryRecordStore {
    fn create<R, E>(&mut self, build: impl FnOnce(R::Id) -> Result<R, E>) -> Result<R, E>
    where
        R: Record,
        E: From<StoreError>,
    {
        let table = self.tables.get_mut::<R>()?;
        let id = table.next_id;
        let record = build(R::Id::from(RecordId::new(id)))?;

        let stored_id = raw_id::<R>(record.id());
        if stored_id != id || table.rows.contains_key(&stored_id) {
            return Err(duplicate::<R>(stored_id).into());
        }
        table.next_id = id + 1;
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    fn try_update<R, E>(
        &mut self,
        id: R::Id,
        change: impl FnOnce(&mut R) -> Result<(), E>,
    ) -> Result<Option<R>, E>
    where
        R: Record,
        E: From<StoreError>,
    {
        let table = self.tables.get_mut::<R>()?;
        let Some(row) = table.rows.get_mut(&raw_id::<R>(id)) else {
            return Ok(None);
        };
        let mut draft = row.clone();
        change(&mut draft)?;
        *row = draft.clone();
        Ok(Some(draft))
    }

    fn delete<R: Record>(&mut self, id: R::Id) -> StoreResult<Option<R>> {
        Ok(self.tables.get_mut::<R>()?.rows.remove(&raw_id::<R>(id)))
    }

    fn find<R: Record>(&self, id: R::Id) -> StoreResult<Option<R>> {
        Ok(self.tables.get::<R>()?.rows.get(&raw_id::<R>(id)).cloned())
    }

    fn find_all_by<R: Record>(&self, predicate: impl Fn(&R) -> bool) -> StoreResult<Vec<R>> {
        Ok(self
            .tables
            .get::<R>()?
            .rows
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }

    fn count<R: Record>(&self) -> StoreResult<usize> {
        Ok(self.tables.get::<R>()?.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servicepro_catalog::{ServiceDetails, ServiceId};
    use servicepro_core::{DomainError, Money};

    fn details(name: &str) -> ServiceDetails {
        ServiceDetails {
            name: name.into(),
            category: "Ремонт".into(),
            duration: "1 год".into(),
            price: Money::from_major(500),
        }
    }

    fn add(store: &mut InMemoryRecordStore, name: &str) -> Result<Service, crate::error::CatalogError> {
        store.create(|id| Ok(Service::new(id, details(name))?))
    }

    #[test]
    fn ids_are_sequential_and_not_reused() {
        let mut store = InMemoryRecordStore::new();
        let a = add(&mut store, "Діагностика").unwrap();
        let b = add(&mut store, "Заміна дисплея").unwrap();
        assert_eq!((a.id().get(), b.id().get()), (1, 2));

        store.delete::<Service>(b.id()).unwrap();
        let c = add(&mut store, "Чистка").unwrap();
        assert_eq!(c.id().get(), 3);
    }

    #[test]
    fn failed_build_consumes_no_id() {
        let mut store = InMemoryRecordStore::new();
        assert!(add(&mut store, "  ").is_err());
        assert_eq!(store.count::<Service>().unwrap(), 0);
        assert_eq!(add(&mut store, "Діагностика").unwrap().id().get(), 1);
    }

    #[test]
    fn failed_update_leaves_record_untouched() {
        let mut store = InMemoryRecordStore::new();
        let s = add(&mut store, "Діагностика").unwrap();

        let result: Result<_, crate::error::CatalogError> = store.try_update::<Service, _>(s.id(), |svc| {
            svc.update(details(""))?;
            Ok(())
        });
        assert!(matches!(result, Err(crate::error::CatalogError::Invalid(DomainError::Validation(_)))));
        assert_eq!(store.find::<Service>(s.id()).unwrap().unwrap().name(), "Діагностика");

        let missing = store.update::<Service>(ServiceId::new(42), |_| {}).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn snapshot_restores_id_counters() {
        let mut store = InMemoryRecordStore::new();
        add(&mut store, "Діагностика").unwrap();
        add(&mut store, "Заміна дисплея").unwrap();

        let mut restored = InMemoryRecordStore::from_snapshot(store.snapshot().unwrap()).unwrap();
        assert_eq!(restored.query_all::<Service>().unwrap().len(), 2);
        assert_eq!(add(&mut restored, "Чистка").unwrap().id().get(), 3);
    }

    #[test]
    fn duplicate_ids_in_snapshot_are_rejected() {
        let mut store = InMemoryRecordStore::new();
        add(&mut store, "Діагностика").unwrap();
        let mut snapshot = store.snapshot().unwrap();
        let copy = snapshot.services[0].clone();
        snapshot.services.push(copy);

        let err = InMemoryRecordStore::from_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { collection: "services", id: 1 }));
    }

    fn register(store: &mut InMemoryRecordStore, name: &str, phone: &str) -> Client {
        let phones = servicepro_clients::PhoneSet::from_raw([phone]).unwrap();
        store
            .create::<Client, StoreError>(|id| Ok(Client::register(id, name, phones)))
            .unwrap()
    }

    #[test]
    fn snapshot_with_a_phone_on_two_clients_is_rejected() {
        let mut store = InMemoryRecordStore::new();
        let first = register(&mut store, "Петренко О.В.", "+380671234567");
        let second = register(&mut store, "Іваненко М.С.", "380 67 123 45 67");

        let err = InMemoryRecordStore::from_snapshot(store.snapshot().unwrap()).unwrap_err();
        match err {
            StoreError::SharedPhone { first: a, second: b, .. } => {
                assert_eq!((a, b), (first.id(), second.id()));
            }
            other => panic!("expected shared phone error, got {other:?}"),
        }
    }

    #[derive(Debug, Clone)]
    struct Misfiled(ClientId);

    impl Entity for Misfiled {
        type Id = ClientId;

        fn id(&self) -> ClientId {
            self.0
        }
    }

    impl Record for Misfiled {
        const COLLECTION: Collection = Collection::Clients;
    }

    #[test]
    fn record_type_must_match_its_collection() {
        let mut store = InMemoryRecordStore::new();
        register(&mut store, "Петренко О.В.", "+380671234567");

        assert!(matches!(
            store.find::<Misfiled>(ClientId::new(1)),
            Err(StoreError::RecordTypeMismatch { collection: "clients", .. })
        ));
        let created = store.create::<Misfiled, StoreError>(|id| Ok(Misfiled(id)));
        assert!(matches!(created, Err(StoreError::RecordTypeMismatch { .. })));
        assert_eq!(store.count::<Client>().unwrap(), 1);
    }
}
