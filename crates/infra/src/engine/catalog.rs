use std::collections::BTreeSet;

use tracing::info;

use servicepro_catalog::{PriceStats, Service, ServiceDetails, ServiceId};
use servicepro_core::Entity;

use crate::error::{CatalogError, StoreResult};
use crate::store::RecordStore;

/// Priced list of the repair services on offer.
pub struct ServiceCatalog<'a, S> {
    store: &'a mut S,
}

impl<'a, S: RecordStore> ServiceCatalog<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn add(&mut self, details: ServiceDetails) -> Result<Service, CatalogError> {
        let service = self
            .store
            .create::<Service, CatalogError>(|id| Ok(Service::new(id, details)?))?;
        info!(service_id = %service.id(), name = service.name(), price = %service.price(), "service added");
        Ok(service)
    }

    pub fn update(&mut self, id: ServiceId, details: ServiceDetails) -> Result<Service, CatalogError> {
        let service = self
            .store
            .try_update::<Service, CatalogError>(id, |s| Ok(s.update(details)?))?
            .ok_or(CatalogError::NotFound(id))?;
        info!(service_id = %id, "service updated");
        Ok(service)
    }

    /// Existing order lines keep their copied name and price.
    pub fn delete(&mut self, id: ServiceId) -> Result<Service, CatalogError> {
        let removed = self
            .store
            .delete::<Service>(id)?
            .ok_or(CatalogError::NotFound(id))?;
        info!(service_id = %id, "service deleted");
        Ok(removed)
    }

    pub fn find(&self, id: ServiceId) -> StoreResult<Option<Service>> {
        self.store.find::<Service>(id)
    }

    pub fn list(&self) -> StoreResult<Vec<Service>> {
        self.store.query_all::<Service>()
    }

    pub fn by_category(&self, category: &str) -> StoreResult<Vec<Service>> {
        self.store.find_all_by::<Service>(|s| s.category() == category)
    }

    pub fn categories(&self) -> StoreResult<Vec<String>> {
        let services = self.list()?;
        let set: BTreeSet<&str> = services
            .iter()
            .map(Service::category)
            .filter(|c| !c.is_empty())
            .collect();
        Ok(set.into_iter().map(str::to_string).collect())
    }

    pub fn price_stats(&self) -> StoreResult<Option<PriceStats>> {
        Ok(PriceStats::of(&self.list()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRecordStore;
    use servicepro_core::Money;

    fn details(name: &str, category: &str, price: i64) -> ServiceDetails {
        ServiceDetails {
            name: name.into(),
            category: category.into(),
            duration: "1 год".into(),
            price: Money::from_major(price),
        }
    }

    #[test]
    fn add_update_delete() {
        let mut store = InMemoryRecordStore::new();
        let mut catalog = ServiceCatalog::new(&mut store);

        let s = catalog.add(details("Діагностика", "Діагностика", 300)).unwrap();
        let updated = catalog.update(s.id(), details("Діагностика", "Діагностика", 350)).unwrap();
        assert_eq!(updated.price(), Money::from_major(350));

        assert!(matches!(
            catalog.update(s.id(), details(" ", "", 1)).unwrap_err(),
            CatalogError::Invalid(_)
        ));
        assert!(catalog.add(details("X", "", -1)).is_err());

        catalog.delete(s.id()).unwrap();
        assert!(matches!(catalog.delete(s.id()).unwrap_err(), CatalogError::NotFound(_)));
        assert!(catalog.find(s.id()).unwrap().is_none());
    }

    #[test]
    fn categories_and_price_stats() {
        let mut store = InMemoryRecordStore::new();
        let mut catalog = ServiceCatalog::new(&mut store);
        assert!(catalog.price_stats().unwrap().is_none());

        catalog.add(details("Діагностика", "Діагностика", 300)).unwrap();
        catalog.add(details("Заміна дисплея", "Ремонт", 500)).unwrap();
        catalog.add(details("Чистка від пилу", "Обслуговування", 600)).unwrap();
        catalog.add(details("Прошивка", "", 450)).unwrap();

        assert_eq!(catalog.categories().unwrap(), vec!["Діагностика", "Обслуговування", "Ремонт"]);
        assert_eq!(catalog.by_category("Ремонт").unwrap().len(), 1);

        let stats = catalog.price_stats().unwrap().unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, Money::from_major(300));
        assert_eq!(stats.max, Money::from_major(600));
        assert_eq!(stats.average, Money::from_minor(46_250));
    }
}
