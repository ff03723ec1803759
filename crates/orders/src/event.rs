use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use servicepro_clients::ClientId;
use servicepro_core::Money;
use servicepro_events::Event;

use crate::order::OrderId;

/// Event: an order entered `ready`; the client should be told to pick it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReady {
    pub event_id: Uuid,
    pub order_id: OrderId,
    pub client_id: ClientId,
    pub number: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: the device was handed back and the balance settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIssued {
    pub event_id: Uuid,
    pub order_id: OrderId,
    pub number: String,
    pub to_pay: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Outbound order notifications. Delivery (SMS, toast, log) is up to the
/// subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Ready(OrderReady),
    Issued(OrderIssued),
}

impl OrderEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::Ready(e) => e.order_id,
            OrderEvent::Issued(e) => e.order_id,
        }
    }

    /// One-line human-readable message for the notifier.
    pub fn message(&self) -> String {
        match self {
            OrderEvent::Ready(e) => format!("Order {} ready", e.number),
            OrderEvent::Issued(e) => format!("Order {} issued, paid {}", e.number, e.to_pay),
        }
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Ready(_) => "orders.order.ready",
            OrderEvent::Issued(_) => "orders.order.issued",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Ready(e) => e.occurred_at,
            OrderEvent::Issued(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ready_message_names_the_order() {
        let event = OrderEvent::Ready(OrderReady {
            event_id: Uuid::nil(),
            order_id: OrderId::new(3),
            client_id: ClientId::new(1),
            number: "R-240201-003".into(),
            occurred_at: Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
        });
        assert_eq!(event.message(), "Order R-240201-003 ready");
        assert_eq!(event.event_type(), "orders.order.ready");
        assert_eq!(event.order_id(), OrderId::new(3));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ready");
        assert_eq!(json["number"], "R-240201-003");
    }
}
