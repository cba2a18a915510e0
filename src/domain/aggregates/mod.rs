//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod user;

pub use product::Product;
pub use order::{filter_orders, Order, OrderItem, OrderStatus, PaymentStatus, StatusFilter, UnknownStatus};
pub use cart::{Cart, CartItem};
pub use user::{Role, User};
