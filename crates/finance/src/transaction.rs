use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use servicepro_core::{DomainError, DomainResult, Entity, Money, record_id};
use servicepro_orders::OrderId;

use crate::category;

record_id!(
    /// Ledger transaction identifier.
    TransactionId
);

/// Direction and nature of a cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Revenue from repairs (prepayments and final payments).
    Income,
    /// Purchases and running costs.
    Expense,
    /// Cash put into the till.
    CashIn,
    /// Cash taken out of the till.
    CashOut,
}

impl TransactionKind {
    /// Whether this kind adds to the cash balance.
    pub fn is_inflow(self) -> bool {
        matches!(self, TransactionKind::Income | TransactionKind::CashIn)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::CashIn => "cash_in",
            TransactionKind::CashOut => "cash_out",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for appending a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Money,
    pub category: String,
    pub order_id: Option<OrderId>,
    pub description: String,
}

impl NewTransaction {
    pub fn new(kind: TransactionKind, amount: Money, category: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            category: category.into(),
            order_id: None,
            description: String::new(),
        }
    }

    pub fn for_order(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredTransaction")]
pub struct Transaction {
    id: TransactionId,
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: Money,
    category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<OrderId>,
    date: DateTime<Utc>,
    description: String,
}

impl Transaction {
    /// Build a ledger entry. The amount must be positive; a blank category
    /// is filed under [`category::OTHER`].
    pub fn record(id: TransactionId, new: NewTransaction, date: DateTime<Utc>) -> DomainResult<Self> {
        if !new.amount.is_positive() {
            return Err(DomainError::validation(format!(
                "transaction amount must be positive, got {}",
                new.amount
            )));
        }
        let category = match new.category.trim() {
            "" => category::OTHER.to_string(),
            c => c.to_string(),
        };
        Ok(Self {
            id,
            kind: new.kind,
            amount: new.amount,
            category,
            order_id: new.order_id,
            date,
            description: new.description.trim().to_string(),
        })
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Amount with the sign it contributes to the cash balance.
    pub fn signed_amount(&self) -> Money {
        if self.kind.is_inflow() { self.amount } else { -self.amount }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> TransactionId {
        self.id
    }
}

/// On-disk shape, replayed through [`Transaction::record`] on load.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTransaction {
    id: TransactionId,
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: Money,
    #[serde(default)]
    category: String,
    #[serde(default)]
    order_id: Option<OrderId>,
    date: DateTime<Utc>,
    #[serde(default)]
    description: String,
}

impl TryFrom<StoredTransaction> for Transaction {
    type Error = DomainError;

    fn try_from(stored: StoredTransaction) -> Result<Self, Self::Error> {
        let new = NewTransaction {
            kind: stored.kind,
            amount: stored.amount,
            category: stored.category,
            order_id: stored.order_id,
            description: stored.description,
        };
        Transaction::record(stored.id, new, stored.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn rejects_non_positive_amounts() {
        for amount in [Money::zero(), Money::from_minor(-100)] {
            let new = NewTransaction::new(TransactionKind::CashIn, amount, "Розмін");
            let err = Transaction::record(TransactionId::new(1), new, test_time()).unwrap_err();
            match err {
                DomainError::Validation(msg) if msg.contains("positive") => {}
                _ => panic!("expected validation error"),
            }
        }
    }

    #[test]
    fn blank_category_becomes_other() {
        let new = NewTransaction::new(TransactionKind::Expense, Money::from_major(150), "   ")
            .with_description("Кава");
        let tx = Transaction::record(TransactionId::new(2), new, test_time()).unwrap();
        assert_eq!(tx.category(), category::OTHER);
        assert_eq!(tx.description(), "Кава");
        assert_eq!(tx.signed_amount(), Money::from_major(-150));
    }

    #[test]
    fn serializes_kind_as_type() {
        let new = NewTransaction::new(TransactionKind::Income, Money::from_major(500), category::PREPAYMENT)
            .for_order(OrderId::new(7));
        let tx = Transaction::record(TransactionId::new(3), new, test_time()).unwrap();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "income");
        assert_eq!(json["orderId"], 7);
        assert_eq!(json["amount"], 50_000);

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn loading_rejects_non_positive_amounts() {
        let json = r#"{"id":4,"type":"income","amount":-70000,"category":"Prepayment","date":"2024-02-01T09:30:00Z"}"#;
        let err = serde_json::from_str::<Transaction>(json).unwrap_err();
        assert!(err.to_string().contains("positive"));

        let json = r#"{"id":5,"type":"expense","amount":15000,"date":"2024-02-01T09:30:00Z"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.category(), category::OTHER);
        assert_eq!(tx.order_id(), None);
    }
}
