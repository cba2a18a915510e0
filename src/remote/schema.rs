//! Wire schemas for the order service, validated at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Order, OrderItem, OrderStatus, PaymentStatus};
use crate::domain::value_objects::{CustomerInfo, Money};
use super::RemoteError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_info: CustomerInfo,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total_amount: Money,
    pub payment_reference: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(alias = "error")]
    pub message: String,
}

/// Order as the upstream sends it.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(alias = "_id")]
    pub id: String,
    pub order_number: String,
    pub customer_info: CustomerInfo,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
}

/// Accepts both a bare order and `{ "order": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OrderEnvelope {
    Wrapped { order: OrderPayload },
    Bare(OrderPayload),
}

/// Accepts both a bare array and `{ "orders": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OrderListEnvelope {
    Wrapped { orders: Vec<OrderPayload> },
    Bare(Vec<OrderPayload>),
}

impl TryFrom<OrderPayload> for Order {
    type Error = RemoteError;

    fn try_from(p: OrderPayload) -> Result<Self, Self::Error> {
        if p.id.trim().is_empty() {
            return Err(RemoteError::InvalidResponse("order without id".into()));
        }
        if p.items.is_empty() {
            return Err(RemoteError::InvalidResponse(format!("order {} has no items", p.id)));
        }
        if let Some(item) = p.items.iter().find(|i| i.quantity == 0) {
            return Err(RemoteError::InvalidResponse(format!("order {} has zero quantity for {}", p.id, item.product_id)));
        }
        if p.total_amount.minor() < 0 {
            return Err(RemoteError::InvalidResponse(format!("order {} has a negative total", p.id)));
        }
        Ok(Order {
            id: p.id, order_number: p.order_number, customer_info: p.customer_info, items: p.items,
            total_amount: p.total_amount, status: p.status, payment_status: p.payment_status,
            payment_reference: p.payment_reference, created_at: p.created_at,
        })
    }
}

impl TryFrom<OrderEnvelope> for Order {
    type Error = RemoteError;

    fn try_from(envelope: OrderEnvelope) -> Result<Self, Self::Error> {
        match envelope { OrderEnvelope::Wrapped { order } | OrderEnvelope::Bare(order) => order.try_into() }
    }
}

impl OrderListEnvelope {
    pub fn into_orders(self) -> Result<Vec<Order>, RemoteError> {
        let payloads = match self { Self::Wrapped { orders } | Self::Bare(orders) => orders };
        payloads.into_iter().map(Order::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: &str = r#"{
        "_id": "65f0c1",
        "orderNumber": "ORD-1001",
        "customerInfo": {"fullName":"Ada","email":"ada@example.com","phone":"080","address":"1 Rd","city":"Lagos","state":"Lagos"},
        "items": [{"productId":"p1","name":"Widget","price":5000,"quantity":1}],
        "totalAmount": 7500,
        "status": "processing",
        "paymentStatus": "paid",
        "paymentReference": "ref-1",
        "createdAt": "2024-05-01T10:00:00Z"
    }"#;

    #[test]
    fn test_accepts_mongo_style_id_and_envelopes() {
        let bare: OrderEnvelope = serde_json::from_str(ORDER).unwrap();
        let order = Order::try_from(bare).unwrap();
        assert_eq!(order.id, "65f0c1");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment_status, PaymentStatus::Paid);

        let wrapped: OrderListEnvelope = serde_json::from_str(&format!(r#"{{"orders":[{ORDER}]}}"#)).unwrap();
        assert_eq!(wrapped.into_orders().unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_unknown_status_and_empty_items() {
        let unknown = ORDER.replace("\"processing\"", "\"teleported\"");
        assert!(serde_json::from_str::<OrderEnvelope>(&unknown).is_err());

        let empty = ORDER.replace(r#"[{"productId":"p1","name":"Widget","price":5000,"quantity":1}]"#, "[]");
        let envelope: OrderEnvelope = serde_json::from_str(&empty).unwrap();
        assert!(matches!(Order::try_from(envelope), Err(RemoteError::InvalidResponse(_))));
    }
}
