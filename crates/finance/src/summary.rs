use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use servicepro_core::{DomainError, Money};

use crate::transaction::{Transaction, TransactionKind};

/// How "this month" is matched when summing month revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueMonthMatch {
    /// Same calendar month of the same year.
    #[default]
    YearAndMonth,
    /// Same calendar month of any year. Counts last year's income too.
    MonthOnly,
}

impl RevenueMonthMatch {
    pub fn matches(self, date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            RevenueMonthMatch::YearAndMonth => {
                date.year() == now.year() && date.month() == now.month()
            }
            RevenueMonthMatch::MonthOnly => date.month() == now.month(),
        }
    }
}

impl core::str::FromStr for RevenueMonthMatch {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year_and_month" => Ok(RevenueMonthMatch::YearAndMonth),
            "month_only" => Ok(RevenueMonthMatch::MonthOnly),
            other => Err(DomainError::validation(format!(
                "unknown revenue month match: {other:?}"
            ))),
        }
    }
}

/// Cash figures derived from the transaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashSummary {
    /// Inflows minus outflows over the whole log.
    pub cash_balance: Money,
    pub today_income: Money,
    pub today_expense: Money,
    pub today_cash_in: Money,
    pub today_cash_out: Money,
    /// `today_income - today_expense`.
    pub profit: Money,
    /// Income in the current calendar month.
    pub month_revenue: Money,
}

impl CashSummary {
    /// Scan `transactions` once. "Today" is the UTC calendar day of `now`.
    pub fn compute<'a>(
        transactions: impl IntoIterator<Item = &'a Transaction>,
        now: DateTime<Utc>,
        month_match: RevenueMonthMatch,
    ) -> Self {
        let today = now.date_naive();
        let mut summary = CashSummary::default();

        for tx in transactions {
            summary.cash_balance += tx.signed_amount();

            if tx.kind() == TransactionKind::Income && month_match.matches(tx.date(), now) {
                summary.month_revenue += tx.amount();
            }

            if tx.date().date_naive() != today {
                continue;
            }
            match tx.kind() {
                TransactionKind::Income => summary.today_income += tx.amount(),
                TransactionKind::Expense => summary.today_expense += tx.amount(),
                TransactionKind::CashIn => summary.today_cash_in += tx.amount(),
                TransactionKind::CashOut => summary.today_cash_out += tx.amount(),
            }
        }

        summary.profit = summary.today_income - summary.today_expense;
        summary
    }
}

/// Inflows minus outflows over `transactions`.
pub fn cash_balance<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Money {
    transactions.into_iter().map(Transaction::signed_amount).sum()
}
