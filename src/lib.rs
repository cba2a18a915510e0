//! OpenSASE Storefront
//!
//! Cart, checkout and order administration for the self-hosted storefront.
//!
//! ## Features
//! - Shopping cart that survives restarts (durable key/value storage)
//! - Checkout: order creation against the order service
//! - Payment reconciliation: widget reports are only trusted after server verification
//! - Admin order list, status filters and fulfillment status changes
//! - Signed-in user remembered per shopper session

pub mod admin;
pub mod cart_store;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod publisher;
pub mod remote;
pub mod routes;
pub mod state;
pub mod storage;
pub mod user_session;

use thiserror::Error;

pub use admin::{AdminGuard, AdminSession, OrderStatusManager};
pub use cart_store::{CartSignal, CartStore};
pub use checkout::{OrderBuilder, PaymentReconciler};
pub use config::Config;
pub use user_session::UserSession;
pub use domain::aggregates::{Cart, CartItem, Order, OrderStatus, PaymentStatus, Product, StatusFilter, User};
pub use domain::value_objects::{CustomerInfo, Money};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please complete your details: {0}")]
    InvalidCustomerInfo(#[from] validator::ValidationErrors),

    #[error("Could not create order: {0}")]
    OrderCreation(String),

    #[error("Payment could not be verified: {0}")]
    PaymentVerification(String),

    #[error("Access denied: {0}")]
    Authorization(String),

    #[error("Stored data is corrupt: {0}")]
    StorageCorruption(String),

    #[error("Could not update order status: {0}")]
    StatusUpdate(String),

    #[error("Could not reach the identity service: {0}")]
    IdentityUnavailable(String),

    #[error("Could not load orders: {0}")]
    OrderFetch(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
