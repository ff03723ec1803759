use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use servicepro_catalog::ServiceId;
use servicepro_clients::ClientId;
use servicepro_core::{DomainError, DomainResult, Entity, Money, ValueObject, record_id};
use servicepro_inventory::PartId;

use crate::intake::OrderIntake;

record_id!(
    /// Repair order identifier.
    OrderId
);

/// Repair order lifecycle.
///
/// Statuses may be assigned in any order; only entering `Ready` and issuing
/// carry side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    Diagnostic,
    InRepair,
    Ready,
    Issued,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Diagnostic => "diagnostic",
            OrderStatus::InRepair => "in_repair",
            OrderStatus::Ready => "ready",
            OrderStatus::Issued => "issued",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Still on the bench: neither handed back nor cancelled.
    pub fn is_active(self) -> bool {
        !matches!(self, OrderStatus::Issued | OrderStatus::Cancelled)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new" => Ok(OrderStatus::New),
            "diagnostic" => Ok(OrderStatus::Diagnostic),
            "in_repair" => Ok(OrderStatus::InRepair),
            "ready" => Ok(OrderStatus::Ready),
            "issued" => Ok(OrderStatus::Issued),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown order status: {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Unknown or blank values fall back to `Normal`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Priority::High,
            "urgent" => Priority::Urgent,
            _ => Priority::Normal,
        }
    }
}

/// Device handed in for repair. All fields are opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "deviceType", default)]
    pub kind: String,
    #[serde(rename = "deviceBrand", default)]
    pub brand: String,
    #[serde(rename = "deviceModel", default)]
    pub model: String,
    #[serde(rename = "deviceSerial", default)]
    pub serial: String,
    #[serde(rename = "devicePassword", default)]
    pub password: String,
}

impl ValueObject for Device {}

/// A part used on an order, with the name and price at the time it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartLine {
    pub part_id: PartId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl ValueObject for PartLine {}

impl PartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A service performed on an order, with its name and price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub service_id: ServiceId,
    pub name: String,
    pub price: Money,
}

impl ValueObject for ServiceLine {}

/// Amounts owed on an order, derived from its current line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub total: Money,
    pub prepayment: Money,
    /// `total - prepayment`. Negative when the client overpaid.
    pub to_pay: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredOrder")]
pub struct RepairOrder {
    id: OrderId,
    number: String,
    client_id: ClientId,
    #[serde(flatten)]
    device: Device,
    issue_description: String,
    status: OrderStatus,
    priority: Priority,
    prepayment: Money,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issued_at: Option<DateTime<Utc>>,
    parts: Vec<PartLine>,
    services: Vec<ServiceLine>,
}

impl RepairOrder {
    /// A new order in status `New` with no line items.
    pub fn open(
        id: OrderId,
        number: impl Into<String>,
        client_id: ClientId,
        intake: &OrderIntake,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if intake.prepayment.is_negative() {
            return Err(DomainError::validation("prepayment cannot be negative"));
        }
        Ok(Self {
            id,
            number: number.into(),
            client_id,
            device: intake.device.clone(),
            issue_description: intake.issue_description.trim().to_string(),
            status: OrderStatus::New,
            priority: intake.priority,
            prepayment: intake.prepayment,
            created_at,
            issued_at: None,
            parts: Vec::new(),
            services: Vec::new(),
        })
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn issue_description(&self) -> &str {
        &self.issue_description
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn prepayment(&self) -> Money {
        self.prepayment
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn is_issued(&self) -> bool {
        self.issued_at.is_some()
    }

    pub fn parts(&self) -> &[PartLine] {
        &self.parts
    }

    pub fn services(&self) -> &[ServiceLine] {
        &self.services
    }

    /// Sum of part lines (quantity × unit price) and service prices.
    ///
    /// Always computed from the current line items; nothing is cached.
    pub fn calculate_total(&self) -> Money {
        let parts: Money = self.parts.iter().map(PartLine::line_total).sum();
        let services: Money = self.services.iter().map(|s| s.price).sum();
        parts + services
    }

    pub fn summary(&self) -> OrderSummary {
        let total = self.calculate_total();
        OrderSummary {
            total,
            prepayment: self.prepayment,
            to_pay: total - self.prepayment,
        }
    }

    pub fn add_part_line(&mut self, line: PartLine) -> DomainResult<()> {
        if line.quantity == 0 {
            return Err(DomainError::validation("part quantity must be positive"));
        }
        if line.unit_price.is_negative() {
            return Err(DomainError::validation("part price cannot be negative"));
        }
        self.parts.push(line);
        Ok(())
    }

    /// Detach the part line at `index`; `None` if there is no such line.
    pub fn remove_part_line(&mut self, index: usize) -> Option<PartLine> {
        (index < self.parts.len()).then(|| self.parts.remove(index))
    }

    pub fn add_service_line(&mut self, line: ServiceLine) -> DomainResult<()> {
        if line.price.is_negative() {
            return Err(DomainError::validation("service price cannot be negative"));
        }
        self.services.push(line);
        Ok(())
    }

    pub fn remove_service_line(&mut self, index: usize) -> Option<ServiceLine> {
        (index < self.services.len()).then(|| self.services.remove(index))
    }

    /// Assign a status directly. Returns `true` when this moves the order
    /// into `Ready` from another status.
    pub fn set_status(&mut self, status: OrderStatus) -> bool {
        let entered_ready = status == OrderStatus::Ready && self.status != OrderStatus::Ready;
        self.status = status;
        entered_ready
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.is_issued() {
            return Err(DomainError::conflict(format!(
                "order {} was already issued",
                self.number
            )));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }

    /// Hand the device back. Stamps `issued_at`; refuses a second issue.
    pub fn mark_issued(&mut self, at: DateTime<Utc>) -> DomainResult<OrderSummary> {
        if self.is_issued() {
            return Err(DomainError::conflict(format!(
                "order {} was already issued",
                self.number
            )));
        }
        let summary = self.summary();
        self.status = OrderStatus::Issued;
        self.issued_at = Some(at);
        Ok(summary)
    }
}

impl Entity for RepairOrder {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

/// On-disk shape. Line items are re-added one by one so a stored order obeys
/// the same rules as one built through [`RepairOrder::open`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredOrder {
    id: OrderId,
    number: String,
    client_id: ClientId,
    #[serde(flatten)]
    device: Device,
    #[serde(default)]
    issue_description: String,
    #[serde(default)]
    status: OrderStatus,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    prepayment: Money,
    created_at: DateTime<Utc>,
    #[serde(default)]
    issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    parts: Vec<PartLine>,
    #[serde(default)]
    services: Vec<ServiceLine>,
}

impl TryFrom<StoredOrder> for RepairOrder {
    type Error = DomainError;

    fn try_from(stored: StoredOrder) -> Result<Self, Self::Error> {
        if stored.prepayment.is_negative() {
            return Err(DomainError::invariant(format!(
                "order {} has a negative prepayment",
                stored.number
            )));
        }
        let mut order = Self {
            id: stored.id,
            number: stored.number,
            client_id: stored.client_id,
            device: stored.device,
            issue_description: stored.issue_description,
            status: stored.status,
            priority: stored.priority,
            prepayment: stored.prepayment,
            created_at: stored.created_at,
            issued_at: stored.issued_at,
            parts: Vec::with_capacity(stored.parts.len()),
            services: Vec::with_capacity(stored.services.len()),
        };
        for line in stored.parts {
            order.add_part_line(line)?;
        }
        for line in stored.services {
            order.add_service_line(line)?;
        }
        Ok(order)
    }
}
