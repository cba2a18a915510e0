use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{Cart, Order, OrderItem};
use crate::domain::value_objects::{CustomerInfo, Money};
use crate::remote::schema::CreateOrderRequest;
use crate::remote::OrderService;
use crate::{Result, StorefrontError};

/// Price breakdown of a cart at checkout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuote {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

impl OrderQuote {
    pub fn for_cart(cart: &Cart, shipping_fee: Money) -> Self {
        let subtotal = cart.total();
        Self { subtotal, shipping: shipping_fee, total: subtotal.add(shipping_fee) }
    }
}

/// Creates pending orders from cart snapshots. Leaves the cart untouched.
#[derive(Clone)]
pub struct OrderBuilder {
    service: Arc<dyn OrderService>,
}

impl OrderBuilder {
    pub fn new(service: Arc<dyn OrderService>) -> Self { Self { service } }

    /// # Errors
    ///
    /// `EmptyCart`, `InvalidCustomerInfo` and `InvalidRequest` (a total that is not
    /// positive) are raised before any remote call.
    /// Upstream failures and an echoed total that differs from the computed one are
    /// `OrderCreation`; the caller must not proceed to payment.
    pub async fn create_order(&self, cart: &Cart, customer: &CustomerInfo, shipping_fee: Money, token: Option<&str>) -> Result<Order> {
        if cart.is_empty() { return Err(StorefrontError::EmptyCart); }
        customer.validate()?;

        let quote = OrderQuote::for_cart(cart, shipping_fee);
        if quote.total <= Money::ZERO {
            tracing::warn!(total = %quote.total, "Refusing checkout for a non-positive total");
            return Err(StorefrontError::InvalidRequest(format!("order total must be positive, got {}", quote.total)));
        }
        let request = CreateOrderRequest {
            customer_info: customer.clone(),
            items: OrderItem::from_cart(cart),
            subtotal: quote.subtotal,
            shipping_fee: quote.shipping,
            total_amount: quote.total,
            payment_reference: Uuid::new_v4().simple().to_string(),
        };

        let order = self.service.create_order(&request, token).await.map_err(|e| {
            tracing::warn!(error = %e, "Order creation failed");
            StorefrontError::OrderCreation(e.to_string())
        })?;

        if order.total_amount != quote.total {
            tracing::error!(order_id = %order.id, expected = %quote.total, returned = %order.total_amount, "Order total diverged");
            return Err(StorefrontError::OrderCreation(format!(
                "order total mismatch: expected {}, order service returned {}", quote.total, order.total_amount
            )));
        }
        if order.payment_reference.is_empty() {
            return Err(StorefrontError::OrderCreation("order service dropped the payment reference".into()));
        }

        tracing::info!(order_id = %order.id, order_number = %order.order_number, total = %order.total_amount, "Order created");
        Ok(order)
    }
}
