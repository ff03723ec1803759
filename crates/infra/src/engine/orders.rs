use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use servicepro_catalog::{Service, ServiceId};
use servicepro_core::{DomainError, Entity, Money};
use servicepro_finance::{NewTransaction, Transaction, TransactionKind, category};
use servicepro_inventory::{InventoryPart, PartId};
use servicepro_orders::{
    OrderEvent, OrderId, OrderIntake, OrderIssued, OrderReady, OrderStatus, OrderSummary, PartLine,
    RepairOrder, ServiceLine, generate_number,
};

use crate::engine::cash::CashLedger;
use crate::engine::clients::ClientRegistry;
use crate::engine::inventory::InventoryLedger;
use crate::error::{OrderError, StockError, StoreResult};
use crate::store::RecordStore;

/// Result of handing a device back to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReceipt {
    pub total: Money,
    pub prepayment: Money,
    /// Negative when the client overpaid; nothing is booked in that case.
    pub to_pay: Money,
    pub transaction: Option<Transaction>,
}

/// Repair-order lifecycle and the stock and cash movements it causes.
///
/// Events raised by an operation are collected in an outbox; the caller
/// publishes them once the store is consistent again.
pub struct OrderEngine<'a, S> {
    store: &'a mut S,
    now: DateTime<Utc>,
    outbox: Vec<OrderEvent>,
}

impl<'a, S: RecordStore> OrderEngine<'a, S> {
    pub fn new(store: &'a mut S, now: DateTime<Utc>) -> Self {
        Self {
            store,
            now,
            outbox: Vec::new(),
        }
    }

    /// Events raised so far, in order.
    pub fn into_events(self) -> Vec<OrderEvent> {
        self.outbox
    }

    pub fn find(&self, id: OrderId) -> StoreResult<Option<RepairOrder>> {
        self.store.find::<RepairOrder>(id)
    }

    fn get(&self, id: OrderId) -> Result<RepairOrder, OrderError> {
        self.find(id)?.ok_or(OrderError::OrderNotFound(id))
    }

    /// All orders, newest first.
    pub fn list(&self) -> StoreResult<Vec<RepairOrder>> {
        let mut orders = self.store.query_all::<RepairOrder>()?;
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(b.id().cmp(&a.id())));
        Ok(orders)
    }

    /// Orders still in the workshop: neither issued nor cancelled.
    pub fn active(&self) -> StoreResult<Vec<RepairOrder>> {
        self.store.find_all_by::<RepairOrder>(|o| o.status().is_active())
    }

    pub fn ready(&self) -> StoreResult<Vec<RepairOrder>> {
        self.store.find_all_by::<RepairOrder>(|o| o.status() == OrderStatus::Ready)
    }

    pub fn summary(&self, id: OrderId) -> Result<OrderSummary, OrderError> {
        Ok(self.get(id)?.summary())
    }

    /// Open an order for a walk-in client.
    ///
    /// Resolves the client by the first phone, counts the order against the
    /// client and books any prepayment as income.
    pub fn create(&mut self, intake: OrderIntake) -> Result<RepairOrder, OrderError> {
        if intake.prepayment.is_negative() {
            return Err(DomainError::validation("prepayment cannot be negative").into());
        }

        let (primary, additional) = match intake.phones.split_first() {
            Some((first, rest)) => (first.as_str(), rest),
            None => ("", &[][..]),
        };
        let client = ClientRegistry::new(&mut *self.store).get_or_create(primary, &intake.client_name, additional)?;

        let orders = self.store.query_all::<RepairOrder>()?;
        let taken: HashSet<&str> = orders.iter().map(RepairOrder::number).collect();
        let number = generate_number(self.now.date_naive(), orders.len(), |n| taken.contains(n));

        let now = self.now;
        let order = self
            .store
            .create::<RepairOrder, OrderError>(|id| Ok(RepairOrder::open(id, number, client.id(), &intake, now)?))?;
        ClientRegistry::new(&mut *self.store).increment_orders(client.id())?;

        if intake.prepayment.is_positive() {
            let prepayment = NewTransaction::new(TransactionKind::Income, intake.prepayment, category::PREPAYMENT)
                .for_order(order.id())
                .with_description(order.number());
            CashLedger::new(&mut *self.store, now).append(prepayment)?;
        }

        info!(
            order_id = %order.id(),
            number = order.number(),
            client_id = %client.id(),
            prepayment = %order.prepayment(),
            "order created"
        );
        Ok(order)
    }

    /// Put `qty` units of a part on the order, taking them out of stock.
    ///
    /// `unit_price` defaults to the part's list price. Either the stock is
    /// deducted and the line appended, or nothing changes.
    pub fn add_part(
        &mut self,
        order_id: OrderId,
        part_id: PartId,
        qty: u32,
        unit_price: Option<Money>,
    ) -> Result<PartLine, OrderError> {
        let order = self.get(order_id)?;
        let part = self
            .store
            .find::<InventoryPart>(part_id)?
            .ok_or(OrderError::PartNotFound(part_id))?;
        let line = PartLine {
            part_id,
            name: part.name().to_string(),
            quantity: qty,
            unit_price: unit_price.unwrap_or(part.unit_price()),
        };
        order.clone().add_part_line(line.clone())?;

        InventoryLedger::new(&mut *self.store, self.now).deduct(part_id, qty)?;
        let appended = self
            .store
            .try_update::<RepairOrder, OrderError>(order_id, |o| Ok(o.add_part_line(line.clone())?))
            .and_then(|o| o.ok_or(OrderError::OrderNotFound(order_id)));
        if let Err(err) = appended {
            warn!(order_id = %order_id, part_id = %part_id, qty, error = %err, "part line rejected, returning stock");
            InventoryLedger::new(&mut *self.store, self.now).return_stock(part_id, qty)?;
            return Err(err);
        }

        info!(
            order_id = %order_id,
            part_id = %part_id,
            qty,
            unit_price = %line.unit_price,
            "part added to order"
        );
        Ok(line)
    }

    /// Take the part line at `index` off the order and put its units back in
    /// stock. An index past the end changes nothing and yields `None`.
    pub fn remove_part(&mut self, order_id: OrderId, index: usize) -> Result<Option<PartLine>, OrderError> {
        let order = self.get(order_id)?;
        let Some(line) = order.parts().get(index).cloned() else {
            debug!(order_id = %order_id, index, "no part line at index");
            return Ok(None);
        };

        match InventoryLedger::new(&mut *self.store, self.now).return_stock(line.part_id, line.quantity) {
            Ok(_) => {}
            Err(StockError::PartNotFound(part_id)) => {
                warn!(order_id = %order_id, part_id = %part_id, "part no longer in inventory, stock not returned");
            }
            Err(err) => return Err(err.into()),
        }
        self.store
            .update::<RepairOrder>(order_id, |o| {
                o.remove_part_line(index);
            })?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        info!(order_id = %order_id, part_id = %line.part_id, qty = line.quantity, "part removed from order");
        Ok(Some(line))
    }

    /// `price` defaults to the catalog price.
    pub fn add_service(
        &mut self,
        order_id: OrderId,
        service_id: ServiceId,
        price: Option<Money>,
    ) -> Result<ServiceLine, OrderError> {
        let service = self
            .store
            .find::<Service>(service_id)?
            .ok_or(OrderError::ServiceNotFound(service_id))?;
        let line = ServiceLine {
            service_id,
            name: service.name().to_string(),
            price: price.unwrap_or(service.price()),
        };
        self.store
            .try_update::<RepairOrder, OrderError>(order_id, |o| Ok(o.add_service_line(line.clone())?))?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        info!(order_id = %order_id, service_id = %service_id, price = %line.price, "service added to order");
        Ok(line)
    }

    pub fn remove_service(&mut self, order_id: OrderId, index: usize) -> Result<Option<ServiceLine>, OrderError> {
        let mut removed = None;
        self.store
            .update::<RepairOrder>(order_id, |o| removed = o.remove_service_line(index))?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        if let Some(line) = &removed {
            info!(order_id = %order_id, service_id = %line.service_id, "service removed from order");
        }
        Ok(removed)
    }

    /// Assign any status. Entering `ready` raises an [`OrderEvent::Ready`].
    pub fn change_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<RepairOrder, OrderError> {
        let mut entered_ready = false;
        let order = self
            .store
            .update::<RepairOrder>(order_id, |o| entered_ready = o.set_status(status))?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        info!(order_id = %order_id, status = %status, "order status changed");

        if entered_ready {
            self.outbox.push(OrderEvent::Ready(OrderReady {
                event_id: Uuid::now_v7(),
                order_id,
                client_id: order.client_id(),
                number: order.number().to_string(),
                occurred_at: self.now,
            }));
        }
        Ok(order)
    }

    /// Parts stay on a cancelled order until removed explicitly.
    pub fn cancel(&mut self, order_id: OrderId) -> Result<RepairOrder, OrderError> {
        let order = self
            .store
            .try_update::<RepairOrder, OrderError>(order_id, |o| {
                if o.is_issued() {
                    return Err(OrderError::AlreadyIssued(order_id));
                }
                Ok(o.cancel()?)
            })
            .inspect_err(|err| warn!(order_id = %order_id, error = %err, "cancel rejected"))?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        info!(order_id = %order_id, "order cancelled");
        Ok(order)
    }

    /// Hand the device back and collect `total - prepayment`.
    ///
    /// Income is booked only for a positive balance. A second call on the
    /// same order fails with [`OrderError::AlreadyIssued`] and books nothing.
    pub fn issue(&mut self, order_id: OrderId) -> Result<IssueReceipt, OrderError> {
        let order = self.get(order_id)?;
        if order.is_issued() {
            warn!(order_id = %order_id, number = order.number(), "order already issued");
            return Err(OrderError::AlreadyIssued(order_id));
        }

        let now = self.now;
        let mut summary = order.summary();
        self.store
            .try_update::<RepairOrder, OrderError>(order_id, |o| {
                summary = o.mark_issued(now)?;
                Ok(())
            })?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let transaction = if summary.to_pay.is_positive() {
            let payment = NewTransaction::new(TransactionKind::Income, summary.to_pay, category::REPAIR_PAYMENT)
                .for_order(order_id)
                .with_description(order.number());
            Some(CashLedger::new(&mut *self.store, now).append(payment)?)
        } else {
            if summary.to_pay.is_negative() {
                warn!(
                    order_id = %order_id,
                    total = %summary.total,
                    prepayment = %summary.prepayment,
                    to_pay = %summary.to_pay,
                    "prepayment exceeds order total"
                );
            }
            None
        };

        info!(order_id = %order_id, number = order.number(), to_pay = %summary.to_pay, "order issued");
        self.outbox.push(OrderEvent::Issued(OrderIssued {
            event_id: Uuid::now_v7(),
            order_id,
            number: order.number().to_string(),
            to_pay: summary.to_pay,
            occurred_at: now,
        }));

        Ok(IssueReceipt {
            total: summary.total,
            prepayment: summary.prepayment,
            to_pay: summary.to_pay,
            transaction,
        })
    }
}
