use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus, PaymentStatus, User};
use crate::domain::value_objects::Money;
use super::schema::{CreateOrderRequest, UpdateStatusRequest, VerifyPaymentResponse};
use super::{IdentityService, OrderService, PaymentVerifier, RemoteError};

const FIRST_ORDER_NUMBER: u64 = 1001;

/// In-process order service. Applies the same checks the upstream does: admin-only
/// listing and status updates, totals that add up, and payment verification that only
/// succeeds for references the gateway has settled.
#[derive(Debug, Default)]
pub struct InMemoryOrderService {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    orders: Vec<Order>,
    issued: u64,
    settled: HashSet<String>,
    users: HashMap<String, User>,
    auto_settle: bool,
    create_calls: usize,
    verify_calls: usize,
}

fn api(status: u16, message: impl Into<String>) -> RemoteError {
    RemoteError::Api { status, message: message.into() }
}

impl InMemoryOrderService {
    pub fn new() -> Self { Self::default() }

    /// Every reference counts as settled, like a gateway sandbox.
    pub fn with_auto_settle() -> Self {
        let service = Self::default();
        service.inner.write().auto_settle = true;
        service
    }

    pub fn register_user(&self, user: User) {
        self.inner.write().users.insert(user.token.clone(), user);
    }

    /// Records that the gateway has received payment for `reference`.
    pub fn settle_payment(&self, reference: impl Into<String>) {
        self.inner.write().settled.insert(reference.into());
    }

    pub fn orders(&self) -> Vec<Order> { self.inner.read().orders.clone() }
    pub fn create_calls(&self) -> usize { self.inner.read().create_calls }
    pub fn verify_calls(&self) -> usize { self.inner.read().verify_calls }

    fn require_admin(inner: &Inner, token: &str) -> Result<(), RemoteError> {
        match inner.users.get(token) {
            Some(user) if user.is_admin() => Ok(()),
            Some(_) => Err(api(403, "Admin access required")),
            None => Err(api(401, "Invalid or expired token")),
        }
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create_order(&self, request: &CreateOrderRequest, token: Option<&str>) -> Result<Order, RemoteError> {
        let mut inner = self.inner.write();
        inner.create_calls += 1;
        if let Some(token) = token {
            if !inner.users.contains_key(token) { return Err(api(401, "Invalid or expired token")); }
        }
        if request.items.is_empty() { return Err(api(422, "Order must contain at least one item")); }
        let subtotal = request.items.iter().fold(Money::ZERO, |acc, i| acc.add(i.price.multiply(i.quantity)));
        if subtotal != request.subtotal || subtotal.add(request.shipping_fee) != request.total_amount {
            return Err(api(422, "Order total does not match its items"));
        }

        let order_number = format!("ORD-{}", FIRST_ORDER_NUMBER + inner.issued);
        inner.issued += 1;
        let order = Order {
            id: Uuid::now_v7().to_string(), order_number, customer_info: request.customer_info.clone(),
            items: request.items.clone(), total_amount: request.total_amount, status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending, payment_reference: request.payment_reference.clone(),
            created_at: Utc::now(),
        };
        inner.orders.push(order.clone());
        Ok(order)
    }

    async fn get_all_orders(&self, token: &str) -> Result<Vec<Order>, RemoteError> {
        let inner = self.inner.read();
        Self::require_admin(&inner, token)?;
        Ok(inner.orders.clone())
    }

    async fn update_order_status(&self, order_id: &str, request: &UpdateStatusRequest, token: &str) -> Result<Order, RemoteError> {
        let mut inner = self.inner.write();
        Self::require_admin(&inner, token)?;
        let order = inner.orders.iter_mut().find(|o| o.id == order_id).ok_or_else(|| api(404, "Order not found"))?;
        order.status = request.status;
        Ok(order.clone())
    }
}

#[async_trait]
impl PaymentVerifier for InMemoryOrderService {
    async fn verify_payment(&self, reference: &str) -> Result<VerifyPaymentResponse, RemoteError> {
        let mut inner = self.inner.write();
        inner.verify_calls += 1;
        let settled = inner.auto_settle || inner.settled.contains(reference);
        let Some(order) = inner.orders.iter_mut().find(|o| o.payment_reference == reference) else {
            return Ok(VerifyPaymentResponse { success: false, message: Some("Unknown payment reference".into()) });
        };
        if !settled {
            return Ok(VerifyPaymentResponse { success: false, message: Some("Payment not completed".into()) });
        }
        order.payment_status = PaymentStatus::Paid;
        Ok(VerifyPaymentResponse { success: true, message: None })
    }
}

#[async_trait]
impl IdentityService for InMemoryOrderService {
    async fn current_user(&self, token: &str) -> Result<User, RemoteError> {
        self.inner.read().users.get(token).cloned().ok_or_else(|| api(401, "Invalid or expired token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{OrderItem, Role};
    use crate::domain::value_objects::CustomerInfo;

    fn request(reference: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_info: CustomerInfo::default(),
            items: vec![OrderItem { product_id: "p1".into(), name: "Widget".into(), price: Money::from_minor(5000), quantity: 1 }],
            subtotal: Money::from_minor(5000), shipping_fee: Money::from_minor(2500), total_amount: Money::from_minor(7500),
            payment_reference: reference.into(),
        }
    }

    #[tokio::test]
    async fn test_assigns_sequential_order_numbers() {
        let service = InMemoryOrderService::new();
        let first = service.create_order(&request("r1"), None).await.unwrap();
        let second = service.create_order(&request("r2"), None).await.unwrap();
        assert_eq!(first.order_number, "ORD-1001");
        assert_eq!(second.order_number, "ORD-1002");
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_rejects_inconsistent_totals() {
        let service = InMemoryOrderService::new();
        let mut bad = request("r1");
        bad.total_amount = Money::from_minor(1);
        assert!(matches!(service.create_order(&bad, None).await, Err(RemoteError::Api { status: 422, .. })));
    }

    #[tokio::test]
    async fn test_verification_requires_settlement() {
        let service = InMemoryOrderService::new();
        service.create_order(&request("r1"), None).await.unwrap();
        assert!(!service.verify_payment("r1").await.unwrap().success);
        service.settle_payment("r1");
        assert!(service.verify_payment("r1").await.unwrap().success);
        assert_eq!(service.orders()[0].payment_status, PaymentStatus::Paid);

        let sandbox = InMemoryOrderService::with_auto_settle();
        sandbox.create_order(&request("r2"), None).await.unwrap();
        assert!(sandbox.verify_payment("r2").await.unwrap().success);
        assert!(!sandbox.verify_payment("r3").await.unwrap().success);
    }

    #[tokio::test]
    async fn test_listing_is_admin_only() {
        let service = InMemoryOrderService::new();
        service.register_user(User { name: "C".into(), email: "c@example.com".into(), role: Role::Customer, token: "c".into() });
        service.register_user(User { name: "A".into(), email: "a@example.com".into(), role: Role::Admin, token: "a".into() });
        assert!(service.get_all_orders("c").await.unwrap_err().is_unauthorized());
        assert!(service.get_all_orders("x").await.unwrap_err().is_unauthorized());
        assert!(service.get_all_orders("a").await.unwrap().is_empty());
    }
}
