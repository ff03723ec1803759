use std::collections::BTreeSet;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use servicepro_core::{DomainError, Entity, Money};
use servicepro_finance::{NewTransaction, Transaction, TransactionKind, category};
use servicepro_inventory::{InventoryPart, NewPart, PartDetails, PartId};

use crate::engine::cash::CashLedger;
use crate::error::{StockError, StoreResult};
use crate::store::RecordStore;

/// One position of a bulk delivery. A zero `unit_cost` means the cost was
/// not given and the part keeps its current basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyLine {
    pub part_id: PartId,
    pub quantity: u32,
    pub unit_cost: Money,
}

/// Outcome of [`InventoryLedger::receive_stock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReceipt {
    pub part: InventoryPart,
    /// The purchase expense, absent when the delivery cost nothing.
    pub transaction: Option<Transaction>,
}

/// Outcome of [`InventoryLedger::receive_supply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyReceipt {
    pub updated_positions: usize,
    pub total: Money,
    pub transaction: Option<Transaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub positions: usize,
    pub low_stock: usize,
    /// Stock valued at list price.
    pub retail_value: Money,
    /// Stock valued at weighted-average cost.
    pub cost_value: Money,
}

/// Stock levels and weighted-average cost per part.
pub struct InventoryLedger<'a, S> {
    store: &'a mut S,
    now: DateTime<Utc>,
}

impl<'a, S: RecordStore> InventoryLedger<'a, S> {
    pub fn new(store: &'a mut S, now: DateTime<Utc>) -> Self {
        Self { store, now }
    }

    pub fn find(&self, id: PartId) -> StoreResult<Option<InventoryPart>> {
        self.store.find::<InventoryPart>(id)
    }

    fn get(&self, id: PartId) -> Result<InventoryPart, StockError> {
        self.find(id)?.ok_or(StockError::PartNotFound(id))
    }

    pub fn list(&self) -> StoreResult<Vec<InventoryPart>> {
        self.store.query_all::<InventoryPart>()
    }

    pub fn by_category(&self, category: &str) -> StoreResult<Vec<InventoryPart>> {
        self.store.find_all_by::<InventoryPart>(|p| p.category() == category)
    }

    /// Distinct non-empty categories, sorted.
    pub fn categories(&self) -> StoreResult<Vec<String>> {
        let parts = self.list()?;
        let set: BTreeSet<&str> = parts
            .iter()
            .map(InventoryPart::category)
            .filter(|c| !c.is_empty())
            .collect();
        Ok(set.into_iter().map(str::to_string).collect())
    }

    pub fn low_stock(&self) -> StoreResult<Vec<InventoryPart>> {
        self.store.find_all_by::<InventoryPart>(InventoryPart::is_low_stock)
    }

    pub fn is_low_stock(&self, id: PartId) -> Result<bool, StockError> {
        Ok(self.get(id)?.is_low_stock())
    }

    pub fn stats(&self) -> StoreResult<InventoryStats> {
        let parts = self.list()?;
        Ok(InventoryStats {
            positions: parts.len(),
            low_stock: parts.iter().filter(|p| p.is_low_stock()).count(),
            retail_value: parts.iter().map(InventoryPart::retail_value).sum(),
            cost_value: parts.iter().map(InventoryPart::cost_value).sum(),
        })
    }

    pub fn add_part(&mut self, part: NewPart) -> Result<InventoryPart, StockError> {
        let part = self
            .store
            .create::<InventoryPart, StockError>(|id| Ok(InventoryPart::new(id, part)?))?;
        info!(part_id = %part.id(), name = part.name(), quantity = part.quantity(), "part added");
        Ok(part)
    }

    pub fn update_details(&mut self, id: PartId, details: PartDetails) -> Result<InventoryPart, StockError> {
        let part = self
            .store
            .try_update::<InventoryPart, StockError>(id, |p| Ok(p.update_details(details)?))?
            .ok_or(StockError::PartNotFound(id))?;
        info!(part_id = %id, "part details updated");
        Ok(part)
    }

    /// Take `qty` units out of stock, all or nothing.
    pub fn deduct(&mut self, id: PartId, qty: u32) -> Result<InventoryPart, StockError> {
        let part = self
            .store
            .try_update::<InventoryPart, StockError>(id, |p| {
                let available = p.quantity();
                if p.deduct(qty) {
                    return Ok(());
                }
                warn!(part_id = %id, requested = qty, available, "insufficient stock");
                Err(StockError::InsufficientStock {
                    part_id: id,
                    requested: qty,
                    available,
                })
            })?
            .ok_or(StockError::PartNotFound(id))?;
        info!(part_id = %id, qty, remaining = part.quantity(), "stock deducted");
        Ok(part)
    }

    /// Put back previously deducted units at the existing cost basis.
    pub fn return_stock(&mut self, id: PartId, qty: u32) -> Result<InventoryPart, StockError> {
        let part = self
            .store
            .update::<InventoryPart>(id, |p| p.return_stock(qty))?
            .ok_or(StockError::PartNotFound(id))?;
        info!(part_id = %id, qty, quantity = part.quantity(), "stock returned");
        Ok(part)
    }

    /// Add purchased units, blending `unit_cost` into the weighted average.
    pub fn receive(&mut self, id: PartId, qty: u32, unit_cost: Money) -> Result<InventoryPart, StockError> {
        if unit_cost.is_negative() {
            return Err(DomainError::validation("unit cost cannot be negative").into());
        }
        let part = self
            .store
            .try_update::<InventoryPart, StockError>(id, |p| Ok(p.receive(qty, unit_cost)?))?
            .ok_or(StockError::PartNotFound(id))?;
        info!(
            part_id = %id,
            qty,
            unit_cost = %unit_cost,
            average_cost = %part.unit_cost(),
            "stock received"
        );
        Ok(part)
    }

    /// Receive a purchase of one part and book its cost as an expense.
    ///
    /// Without `unit_cost` the units come in at the part's current cost.
    pub fn receive_stock(
        &mut self,
        id: PartId,
        qty: u32,
        unit_cost: Option<Money>,
        note: &str,
    ) -> Result<StockReceipt, StockError> {
        if qty == 0 {
            return Err(DomainError::validation("received quantity must be positive").into());
        }
        let current = self.get(id)?;
        let cost = unit_cost.unwrap_or(current.unit_cost());
        let amount = cost.checked_times(qty).ok_or_else(amount_overflow)?;
        let part = self.receive(id, qty, cost)?;

        let transaction = if amount.is_positive() {
            let new = NewTransaction::new(TransactionKind::Expense, amount, category::purchase(part.name()))
                .with_description(note);
            Some(CashLedger::new(&mut *self.store, self.now).append(new)?)
        } else {
            None
        };
        Ok(StockReceipt { part, transaction })
    }

    /// Receive a delivery of several parts, booked as one expense.
    ///
    /// Every line is checked against a staged copy of its part first; if any
    /// line fails, nothing is received.
    pub fn receive_supply(&mut self, lines: &[SupplyLine], note: &str) -> Result<SupplyReceipt, StockError> {
        let mut staged: HashMap<PartId, InventoryPart> = HashMap::new();
        let mut plan = Vec::with_capacity(lines.len());
        let mut total = Money::zero();
        for line in lines {
            if line.unit_cost.is_negative() {
                return Err(DomainError::validation("unit cost cannot be negative").into());
            }
            let part = match staged.entry(line.part_id) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(self.get(line.part_id)?),
            };
            if line.quantity == 0 {
                continue;
            }
            let cost = if line.unit_cost.is_zero() {
                part.unit_cost()
            } else {
                line.unit_cost
            };
            part.receive(line.quantity, cost)?;
            total = cost
                .checked_times(line.quantity)
                .and_then(|amount| total.checked_add(amount))
                .ok_or_else(amount_overflow)?;
            plan.push((line.part_id, line.quantity, cost));
        }

        for &(part_id, quantity, cost) in &plan {
            self.receive(part_id, quantity, cost)?;
        }
        let updated_positions = plan.len();

        let transaction = if total.is_positive() {
            let new = NewTransaction::new(TransactionKind::Expense, total, category::SUPPLY)
                .with_description(note);
            Some(CashLedger::new(&mut *self.store, self.now).append(new)?)
        } else {
            None
        };
        info!(positions = updated_positions, total = %total, "supply received");
        Ok(SupplyReceipt {
            updated_positions,
            total,
            transaction,
        })
    }

    /// Remove damaged or lost units. No ledger entry is made.
    pub fn write_off(&mut self, id: PartId, qty: u32, reason: &str) -> Result<InventoryPart, StockError> {
        if qty == 0 {
            return Err(DomainError::validation("write-off quantity must be positive").into());
        }
        let part = self.deduct(id, qty)?;
        info!(part_id = %id, qty, reason, "stock written off");
        Ok(part)
    }
}

fn amount_overflow() -> StockError {
    DomainError::validation("purchase amount is too large").into()
}
