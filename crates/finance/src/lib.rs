//! Cash ledger domain module.
//!
//! Transactions are append-only facts. Every figure the shop looks at
//! (cash balance, today's takings, month revenue) is recomputed from the full
//! log on demand.

pub mod category;
pub mod summary;
pub mod transaction;

pub use summary::{CashSummary, RevenueMonthMatch, cash_balance};
pub use transaction::{NewTransaction, Transaction, TransactionId, TransactionKind};
