//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::domain::aggregates::Cart;
use crate::domain::value_objects::{CustomerInfo, Money};

/// A server-persisted order. Items, customer details and total are fixed at creation;
/// only `status` and `payment_status` move afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer_info: CustomerInfo,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem { pub product_id: String, pub name: String, pub price: Money, pub quantity: u32 }

impl OrderItem {
    pub fn from_cart(cart: &Cart) -> Vec<OrderItem> {
        cart.items().iter().map(|i| OrderItem {
            product_id: i.id.clone(), name: i.name.clone(), price: i.unit_price, quantity: i.quantity.value(),
        }).collect()
    }
}

/// Fulfillment lifecycle, administrator controlled. Any status may follow any other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled }

/// Payment lifecycle, driven by the gateway confirmation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed }

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [Self::Pending, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Processing => "processing", Self::Shipped => "shipped",
            Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str().eq_ignore_ascii_case(s.trim())).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Status pseudo-filter used by the admin order list; `All` applies no predicate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter { #[default] All, Only(OrderStatus) }

impl StatusFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self { Self::All => true, Self::Only(status) => order.status == *status }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") { return Ok(Self::All); }
        s.parse().map(Self::Only)
    }
}

/// Orders matching `filter`, in their original relative order.
pub fn filter_orders(orders: &[Order], filter: StatusFilter) -> Vec<&Order> {
    orders.iter().filter(|o| filter.matches(o)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownStatus(pub String);
impl std::error::Error for UnknownStatus {}
impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Unknown order status: {}", self.0) }
}
