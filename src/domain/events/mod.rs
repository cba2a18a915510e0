//! Domain events
use crate::domain::aggregates::{Order, OrderStatus};
use crate::domain::value_objects::Money;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: String, order_number: String, total: Money },
    PaymentConfirmed { order_id: String, reference: String },
    PaymentVerificationFailed { order_id: String, reference: String, reason: String },
    PaymentCancelled { order_id: String, reference: String },
    StatusChanged { order_id: String, from: Option<OrderStatus>, to: OrderStatus },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> String {
        match self {
            DomainEvent::Order(e) => format!("storefront.orders.{}", e.kind()),
        }
    }
}

impl OrderEvent {
    pub fn created(order: &Order) -> DomainEvent {
        DomainEvent::Order(Self::Created {
            order_id: order.id.clone(), order_number: order.order_number.clone(), total: order.total_amount,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::PaymentConfirmed { .. } => "payment_confirmed",
            Self::PaymentVerificationFailed { .. } => "payment_verification_failed",
            Self::PaymentCancelled { .. } => "payment_cancelled",
            Self::StatusChanged { .. } => "status_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_and_payload() {
        let event = DomainEvent::Order(OrderEvent::StatusChanged { order_id: "o1".into(), from: Some(OrderStatus::Pending), to: OrderStatus::Shipped });
        assert_eq!(event.subject(), "storefront.orders.status_changed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["aggregate"], "order");
        assert_eq!(json["event"]["type"], "status_changed");
        assert_eq!(json["event"]["to"], "shipped");
    }
}
