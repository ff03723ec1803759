//! Demo records for a fresh workshop.

use chrono::{DateTime, Utc};
use tracing::info;

use servicepro_catalog::{Service, ServiceDetails};
use servicepro_clients::{Client, PhoneSet};
use servicepro_core::{Entity, Money};
use servicepro_inventory::{InventoryPart, NewPart};
use servicepro_orders::{
    Device, OrderIntake, OrderStatus, PartLine, Priority, RepairOrder, ServiceLine,
};

use crate::error::WorkshopError;
use crate::store::RecordStore;

/// Fill an empty store with two clients, three parts, three services and one
/// order in repair, opened at `now`. Seeding does not book stock movements or
/// cash.
pub fn seed_demo_data<S: RecordStore>(store: &mut S, now: DateTime<Utc>) -> Result<(), WorkshopError> {
    let petrenko = add_client(store, "Петренко О.В.", "+380671234567", 2)?;
    add_client(store, "Іваненко М.С.", "+380501112233", 1)?;

    let display = add_part(store, "Дисплей iPhone 12", "IP12-DISP", "Дисплеї", 5, 2200, 2800)?;
    add_part(store, "Батарея ASUS", "ASUS-BAT", "АКБ", 3, 900, 1200)?;
    add_part(store, "Клавіатура HP", "HP-KB", "Клавіатури", 10, 600, 800)?;

    add_service(store, "Діагностика", "Діагностика", "30-60 хв", 300)?;
    let screen_swap = add_service(store, "Заміна дисплея", "Ремонт", "1-2 год", 500)?;
    add_service(store, "Чистка від пилу", "Обслуговування", "1 год", 600)?;

    let mut intake = OrderIntake::new(petrenko.name(), petrenko.phones().iter());
    intake.device = Device {
        kind: "Смартфон".into(),
        brand: "Apple".into(),
        model: "iPhone 12".into(),
        ..Device::default()
    };
    intake.issue_description = "Розбитий дисплей".into();
    intake.priority = Priority::High;
    intake.prepayment = Money::from_major(1000);

    store.create::<RepairOrder, WorkshopError>(|id| {
        let mut order = RepairOrder::open(id, "R-240201-001", petrenko.id(), &intake, now)?;
        order.add_part_line(PartLine {
            part_id: display.id(),
            name: display.name().to_string(),
            quantity: 1,
            unit_price: display.unit_price(),
        })?;
        order.add_service_line(ServiceLine {
            service_id: screen_swap.id(),
            name: screen_swap.name().to_string(),
            price: screen_swap.price(),
        })?;
        order.set_status(OrderStatus::InRepair);
        Ok(order)
    })?;

    info!("demo data seeded");
    Ok(())
}

fn add_client<S: RecordStore>(
    store: &mut S,
    name: &str,
    phone: &str,
    orders: u32,
) -> Result<Client, WorkshopError> {
    let phones = PhoneSet::from_raw([phone])?;
    store.create::<Client, WorkshopError>(|id| {
        let mut client = Client::register(id, name, phones);
        for _ in 0..orders {
            client.record_order();
        }
        Ok(client)
    })
}

fn add_part<S: RecordStore>(
    store: &mut S,
    name: &str,
    sku: &str,
    category: &str,
    quantity: u32,
    cost: i64,
    price: i64,
) -> Result<InventoryPart, WorkshopError> {
    let part = NewPart {
        name: name.into(),
        sku: sku.into(),
        category: category.into(),
        quantity,
        unit_cost: Money::from_major(cost),
        unit_price: Money::from_major(price),
    };
    store.create::<InventoryPart, WorkshopError>(|id| Ok(InventoryPart::new(id, part)?))
}

fn add_service<S: RecordStore>(
    store: &mut S,
    name: &str,
    category: &str,
    duration: &str,
    price: i64,
) -> Result<Service, WorkshopError> {
    let details = ServiceDetails {
        name: name.into(),
        category: category.into(),
        duration: duration.into(),
        price: Money::from_major(price),
    };
    store.create::<Service, WorkshopError>(|id| Ok(Service::new(id, details)?))
}
