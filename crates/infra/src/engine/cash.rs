use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use servicepro_core::{DomainError, Entity, Money};
use servicepro_finance::{
    CashSummary, NewTransaction, RevenueMonthMatch, Transaction, TransactionKind,
};
use servicepro_orders::OrderId;

use crate::error::{LedgerError, StoreResult};
use crate::store::RecordStore;

/// Append-only cash ledger and its derived views.
pub struct CashLedger<'a, S> {
    store: &'a mut S,
    now: DateTime<Utc>,
}

impl<'a, S: RecordStore> CashLedger<'a, S> {
    pub fn new(store: &'a mut S, now: DateTime<Utc>) -> Self {
        Self { store, now }
    }

    /// Append one transaction dated `now`.
    pub fn append(&mut self, new: NewTransaction) -> Result<Transaction, LedgerError> {
        let now = self.now;
        let tx = self
            .store
            .create::<Transaction, LedgerError>(|id| Ok(Transaction::record(id, new, now)?))?;
        info!(
            transaction_id = %tx.id(),
            kind = %tx.kind(),
            amount = %tx.amount(),
            category = tx.category(),
            order_id = tx.order_id().map(|id| id.get()),
            "ledger transaction appended"
        );
        Ok(tx)
    }

    /// Manual till operation: cash put in, cash taken out, or an expense.
    /// Income is only ever booked through orders.
    pub fn record(
        &mut self,
        kind: TransactionKind,
        amount: Money,
        category: &str,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        if kind == TransactionKind::Income {
            warn!("manual income entry rejected");
            return Err(DomainError::validation("income is recorded through orders").into());
        }
        self.append(NewTransaction::new(kind, amount, category).with_description(description))
    }

    /// The last `limit` transactions, newest first, then narrowed to `kind`.
    pub fn recent(&self, limit: usize, kind: Option<TransactionKind>) -> StoreResult<Vec<Transaction>> {
        let all = self.store.query_all::<Transaction>()?;
        let skip = all.len().saturating_sub(limit);
        Ok(all
            .into_iter()
            .skip(skip)
            .rev()
            .filter(|tx| kind.is_none_or(|k| tx.kind() == k))
            .collect())
    }

    pub fn for_order(&self, order_id: OrderId) -> StoreResult<Vec<Transaction>> {
        self.store.find_all_by::<Transaction>(|tx| tx.order_id() == Some(order_id))
    }

    pub fn count(&self) -> StoreResult<usize> {
        self.store.count::<Transaction>()
    }

    /// Balance, today's partitions and month revenue, recomputed from the
    /// full log.
    pub fn summary(&self, month_match: RevenueMonthMatch) -> StoreResult<CashSummary> {
        let log = self.store.query_all::<Transaction>()?;
        let summary = CashSummary::compute(&log, self.now, month_match);
        debug!(transactions = log.len(), balance = %summary.cash_balance, "cash summary computed");
        Ok(summary)
    }
}
