//! `Workshop`: the engine's entry point.
//!
//! One lock guards the whole record store. Every operation, including the
//! compound ones (`create_order`, `add_part_to_order`, `issue_order`), runs
//! inside a single critical section and reads the clock once. Order events
//! are published after the lock is released.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use servicepro_catalog::{PriceStats, Service, ServiceDetails, ServiceId};
use servicepro_clients::{Client, ClientId};
use servicepro_core::Money;
use servicepro_events::{Event, EventBus, InMemoryEventBus, Subscription};
use servicepro_finance::{CashSummary, Transaction, TransactionKind};
use servicepro_inventory::{InventoryPart, NewPart, PartDetails, PartId};
use servicepro_orders::{
    IntakeForm, OrderEvent, OrderId, OrderIntake, OrderStatus, OrderSummary, PartLine, RepairOrder,
    ServiceLine,
};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::engine::{
    CashLedger, ClientRegistry, InventoryLedger, InventoryStats, IssueReceipt, OrderEngine,
    ServiceCatalog, StockReceipt, SupplyLine, SupplyReceipt,
};
use crate::error::{
    CatalogError, ClientError, LedgerError, OrderError, StockError, StoreError, StoreResult,
    WorkshopError,
};
use crate::seed::seed_demo_data;
use crate::store::{InMemoryRecordStore, RecordStore, Snapshot};

/// Number of orders shown on the dashboard.
const DASHBOARD_RECENT_ORDERS: usize = 6;

/// Front-page figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub active_orders: usize,
    pub ready_orders: usize,
    pub month_revenue: Money,
    pub client_count: usize,
    /// Newest first.
    pub recent_orders: Vec<RepairOrder>,
}

pub struct Workshop<S = InMemoryRecordStore, B = Arc<InMemoryEventBus<OrderEvent>>> {
    store: Mutex<S>,
    bus: B,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl Workshop {
    /// Load the snapshot named by `config`, or start empty (seeded when
    /// `seed_demo_data` is set).
    pub fn open(config: EngineConfig) -> Result<Self, WorkshopError> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// [`open`](Self::open) with an injected clock, used for seeding and for
    /// every later operation.
    pub fn open_with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, WorkshopError> {
        let loaded = match &config.snapshot_path {
            Some(path) => Snapshot::load(path)?,
            None => None,
        };

        let store = match loaded {
            Some(snapshot) => {
                let store = InMemoryRecordStore::from_snapshot(snapshot)?;
                info!(path = ?config.snapshot_path, "workshop loaded from snapshot");
                store
            }
            None => {
                let mut store = InMemoryRecordStore::new();
                if config.seed_demo_data {
                    seed_demo_data(&mut store, clock.now())?;
                }
                info!(seeded = config.seed_demo_data, "workshop started empty");
                store
            }
        };

        Ok(Self::new(store, Arc::new(InMemoryEventBus::new()), clock, config))
    }

    /// Empty in-memory workshop with no snapshot file.
    pub fn in_memory() -> Self {
        Self::new(
            InMemoryRecordStore::new(),
            Arc::new(InMemoryEventBus::new()),
            Arc::new(SystemClock),
            EngineConfig::in_memory(),
        )
    }
}

impl<S, B> Workshop<S, B>
where
    S: RecordStore,
    B: EventBus<OrderEvent>,
{
    pub fn new(store: S, bus: B, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            store: Mutex::new(store),
            bus,
            clock,
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Receive every order event published from now on.
    pub fn subscribe(&self) -> Subscription<OrderEvent> {
        self.bus.subscribe()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, S>> {
        self.store.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Run `op` inside the critical section with the current time.
    fn transact<T, E>(&self, op: impl FnOnce(&mut S, DateTime<Utc>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let now = self.clock.now();
        let mut store = self.lock()?;
        op(&mut *store, now)
    }

    fn transact_orders<T>(
        &self,
        op: impl FnOnce(&mut OrderEngine<'_, S>) -> Result<T, OrderError>,
    ) -> Result<T, OrderError> {
        let (result, events) = self.transact(|store, now| {
            let mut engine = OrderEngine::new(store, now);
            let result = op(&mut engine);
            Ok::<_, OrderError>((result, engine.into_events()))
        })?;
        self.publish(events);
        result
    }

    fn publish(&self, events: Vec<OrderEvent>) {
        for event in events {
            info!(
                event_type = event.event_type(),
                version = event.version(),
                occurred_at = %event.occurred_at(),
                order_id = %event.order_id(),
                message = %event.message(),
                "order notification"
            );
            if let Err(err) = self.bus.publish(event) {
                warn!(error = ?err, "order notification not delivered");
            }
        }
    }

    // Clients

    pub fn client(&self, id: ClientId) -> StoreResult<Option<Client>> {
        self.transact(|store, _| ClientRegistry::new(store).find(id))
    }

    pub fn find_client_by_phone(&self, phone: &str) -> StoreResult<Option<Client>> {
        self.transact(|store, _| ClientRegistry::new(store).find_by_phone(phone))
    }

    pub fn get_or_create_client(
        &self,
        primary_phone: &str,
        name: &str,
        additional_phones: &[String],
    ) -> Result<Client, ClientError> {
        self.transact(|store, _| ClientRegistry::new(store).get_or_create(primary_phone, name, additional_phones))
    }

    pub fn update_client(
        &self,
        id: ClientId,
        name: &str,
        phones: &[String],
        email: Option<&str>,
    ) -> Result<Client, ClientError> {
        self.transact(|store, _| ClientRegistry::new(store).update_details(id, name, phones, email))
    }

    pub fn search_clients(&self, term: &str) -> StoreResult<Vec<Client>> {
        self.transact(|store, _| ClientRegistry::new(store).search(term))
    }

    pub fn clients(&self) -> StoreResult<Vec<Client>> {
        self.transact(|store, _| ClientRegistry::new(store).list())
    }

    pub fn client_history(&self, id: ClientId) -> StoreResult<Vec<RepairOrder>> {
        self.transact(|store, _| ClientRegistry::new(store).history(id))
    }

    // Inventory

    pub fn part(&self, id: PartId) -> StoreResult<Option<InventoryPart>> {
        self.transact(|store, now| InventoryLedger::new(store, now).find(id))
    }

    pub fn parts(&self) -> StoreResult<Vec<InventoryPart>> {
        self.transact(|store, now| InventoryLedger::new(store, now).list())
    }

    pub fn parts_by_category(&self, category: &str) -> StoreResult<Vec<InventoryPart>> {
        self.transact(|store, now| InventoryLedger::new(store, now).by_category(category))
    }

    pub fn part_categories(&self) -> StoreResult<Vec<String>> {
        self.transact(|store, now| InventoryLedger::new(store, now).categories())
    }

    pub fn low_stock(&self) -> StoreResult<Vec<InventoryPart>> {
        self.transact(|store, now| InventoryLedger::new(store, now).low_stock())
    }

    pub fn inventory_stats(&self) -> StoreResult<InventoryStats> {
        self.transact(|store, now| InventoryLedger::new(store, now).stats())
    }

    pub fn add_part(&self, part: NewPart) -> Result<InventoryPart, StockError> {
        self.transact(|store, now| InventoryLedger::new(store, now).add_part(part))
    }

    pub fn update_part(&self, id: PartId, details: PartDetails) -> Result<InventoryPart, StockError> {
        self.transact(|store, now| InventoryLedger::new(store, now).update_details(id, details))
    }

    pub fn receive_stock(
        &self,
        id: PartId,
        qty: u32,
        unit_cost: Option<Money>,
        note: &str,
    ) -> Result<StockReceipt, StockError> {
        self.transact(|store, now| InventoryLedger::new(store, now).receive_stock(id, qty, unit_cost, note))
    }

    pub fn receive_supply(&self, lines: &[SupplyLine], note: &str) -> Result<SupplyReceipt, StockError> {
        self.transact(|store, now| InventoryLedger::new(store, now).receive_supply(lines, note))
    }

    pub fn write_off(&self, id: PartId, qty: u32, reason: &str) -> Result<InventoryPart, StockError> {
        self.transact(|store, now| InventoryLedger::new(store, now).write_off(id, qty, reason))
    }

    // Service catalog

    pub fn service(&self, id: ServiceId) -> StoreResult<Option<Service>> {
        self.transact(|store, _| ServiceCatalog::new(store).find(id))
    }

    pub fn services(&self) -> StoreResult<Vec<Service>> {
        self.transact(|store, _| ServiceCatalog::new(store).list())
    }

    pub fn services_by_category(&self, category: &str) -> StoreResult<Vec<Service>> {
        self.transact(|store, _| ServiceCatalog::new(store).by_category(category))
    }

    pub fn service_categories(&self) -> StoreResult<Vec<String>> {
        self.transact(|store, _| ServiceCatalog::new(store).categories())
    }

    pub fn service_price_stats(&self) -> StoreResult<Option<PriceStats>> {
        self.transact(|store, _| ServiceCatalog::new(store).price_stats())
    }

    pub fn add_service(&self, details: ServiceDetails) -> Result<Service, CatalogError> {
        self.transact(|store, _| ServiceCatalog::new(store).add(details))
    }

    pub fn update_service(&self, id: ServiceId, details: ServiceDetails) -> Result<Service, CatalogError> {
        self.transact(|store, _| ServiceCatalog::new(store).update(id, details))
    }

    pub fn delete_service(&self, id: ServiceId) -> Result<Service, CatalogError> {
        self.transact(|store, _| ServiceCatalog::new(store).delete(id))
    }

    // Orders

    pub fn create_order(&self, intake: OrderIntake) -> Result<RepairOrder, OrderError> {
        self.transact_orders(|engine| engine.create(intake))
    }

    /// Open an order from raw form values; see [`IntakeForm`].
    pub fn create_order_from_form(&self, form: IntakeForm) -> Result<RepairOrder, OrderError> {
        self.create_order(form.into())
    }

    pub fn order(&self, id: OrderId) -> StoreResult<Option<RepairOrder>> {
        self.transact(|store, now| OrderEngine::new(store, now).find(id))
    }

    pub fn orders(&self) -> StoreResult<Vec<RepairOrder>> {
        self.transact(|store, now| OrderEngine::new(store, now).list())
    }

    pub fn active_orders(&self) -> StoreResult<Vec<RepairOrder>> {
        self.transact(|store, now| OrderEngine::new(store, now).active())
    }

    pub fn ready_orders(&self) -> StoreResult<Vec<RepairOrder>> {
        self.transact(|store, now| OrderEngine::new(store, now).ready())
    }

    pub fn order_summary(&self, id: OrderId) -> Result<OrderSummary, OrderError> {
        self.transact(|store, now| OrderEngine::new(store, now).summary(id))
    }

    pub fn add_part_to_order(
        &self,
        order_id: OrderId,
        part_id: PartId,
        qty: u32,
        unit_price: Option<Money>,
    ) -> Result<PartLine, OrderError> {
        self.transact_orders(|engine| engine.add_part(order_id, part_id, qty, unit_price))
    }

    pub fn remove_part_from_order(&self, order_id: OrderId, index: usize) -> Result<Option<PartLine>, OrderError> {
        self.transact_orders(|engine| engine.remove_part(order_id, index))
    }

    pub fn add_service_to_order(
        &self,
        order_id: OrderId,
        service_id: ServiceId,
        price: Option<Money>,
    ) -> Result<ServiceLine, OrderError> {
        self.transact_orders(|engine| engine.add_service(order_id, service_id, price))
    }

    pub fn remove_service_from_order(
        &self,
        order_id: OrderId,
        index: usize,
    ) -> Result<Option<ServiceLine>, OrderError> {
        self.transact_orders(|engine| engine.remove_service(order_id, index))
    }

    pub fn change_status(&self, order_id: OrderId, status: OrderStatus) -> Result<RepairOrder, OrderError> {
        self.transact_orders(|engine| engine.change_status(order_id, status))
    }

    pub fn cancel_order(&self, order_id: OrderId) -> Result<RepairOrder, OrderError> {
        self.transact_orders(|engine| engine.cancel(order_id))
    }

    pub fn issue_order(&self, order_id: OrderId) -> Result<IssueReceipt, OrderError> {
        self.transact_orders(|engine| engine.issue(order_id))
    }

    // Cash

    pub fn record_cash(
        &self,
        kind: TransactionKind,
        amount: Money,
        category: &str,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        self.transact(|store, now| CashLedger::new(store, now).record(kind, amount, category, description))
    }

    /// The configured number of latest transactions, optionally one kind only.
    pub fn recent_transactions(&self, kind: Option<TransactionKind>) -> StoreResult<Vec<Transaction>> {
        let limit = self.config.recent_transactions;
        self.transact(|store, now| CashLedger::new(store, now).recent(limit, kind))
    }

    pub fn order_transactions(&self, order_id: OrderId) -> StoreResult<Vec<Transaction>> {
        self.transact(|store, now| CashLedger::new(store, now).for_order(order_id))
    }

    pub fn transaction_count(&self) -> StoreResult<usize> {
        self.transact(|store, now| CashLedger::new(store, now).count())
    }

    pub fn cash_summary(&self) -> StoreResult<CashSummary> {
        let month_match = self.config.revenue_month_match;
        self.transact(|store, now| CashLedger::new(store, now).summary(month_match))
    }

    pub fn dashboard(&self) -> StoreResult<Dashboard> {
        let month_match = self.config.revenue_month_match;
        self.transact(|store, now| {
            let month_revenue = CashLedger::new(&mut *store, now).summary(month_match)?.month_revenue;
            let client_count = ClientRegistry::new(&mut *store).list()?.len();

            let orders = OrderEngine::new(store, now);
            let mut recent_orders = orders.list()?;
            recent_orders.truncate(DASHBOARD_RECENT_ORDERS);
            Ok(Dashboard {
                active_orders: orders.active()?.len(),
                ready_orders: orders.ready()?.len(),
                month_revenue,
                client_count,
                recent_orders,
            })
        })
    }

    // Lifecycle

    /// The whole state as one JSON document.
    pub fn export_snapshot(&self) -> StoreResult<String> {
        let snapshot = self.transact(|store, _| store.snapshot())?;
        snapshot.to_json()
    }

    /// Write the snapshot file, if one is configured.
    pub fn flush(&self) -> StoreResult<()> {
        let Some(path) = &self.config.snapshot_path else {
            debug!("no snapshot path configured, nothing to flush");
            return Ok(());
        };
        let snapshot = self.transact(|store, _| store.snapshot())?;
        snapshot.save(path)?;
        info!(path = %path.display(), "snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use servicepro_core::Entity;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()))
    }

    #[test]
    fn ready_notification_is_published_after_the_operation() {
        let workshop = Workshop::in_memory().with_clock(clock());
        let subscription = workshop.subscribe();

        let order = workshop
            .create_order(OrderIntake::new("Петренко О.В.", ["+380671234567"]))
            .unwrap();
        assert!(subscription.drain().is_empty());

        workshop.change_status(order.id(), OrderStatus::Ready).unwrap();
        let events = subscription.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message(), "Order R-240201-001 ready");
    }

    #[test]
    fn open_seeds_demo_data_when_asked() {
        let config = EngineConfig {
            seed_demo_data: true,
            ..EngineConfig::in_memory()
        };
        let workshop = Workshop::open_with_clock(config, clock()).unwrap();

        let dashboard = workshop.dashboard().unwrap();
        assert_eq!(dashboard.client_count, 2);
        assert_eq!(dashboard.active_orders, 1);
        assert_eq!(dashboard.ready_orders, 0);
        assert_eq!(dashboard.recent_orders.len(), 1);
        assert_eq!(dashboard.month_revenue, Money::zero());
        assert_eq!(dashboard.recent_orders[0].created_at(), clock().now());
    }

    #[test]
    fn flush_then_reopen_restores_state() {
        let dir = std::env::temp_dir().join(format!("servicepro-workshop-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::fs::remove_file(dir.join("state.json"));
        let config = EngineConfig {
            snapshot_path: Some(dir.join("state.json")),
            seed_demo_data: false,
            ..EngineConfig::default()
        };

        let workshop = Workshop::open(config.clone()).unwrap().with_clock(clock());
        let order = workshop
            .create_order(OrderIntake::new("Іваненко М.С.", ["+380501112233"]))
            .unwrap();
        workshop.flush().unwrap();

        let reopened = Workshop::open(config).unwrap();
        assert_eq!(reopened.order(order.id()).unwrap().unwrap().number(), order.number());
        assert_eq!(reopened.clients().unwrap().len(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
