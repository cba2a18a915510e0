//! Remote collaborators: order service, payment verification, identity.
//!
//! The traits are the seams the checkout and admin components are written against.
//! [`HttpOrderService`] talks to the real upstream; [`InMemoryOrderService`] stands in
//! for it during local development and in tests.

mod http;
mod memory;
pub mod schema;

pub use http::HttpOrderService;
pub use memory::InMemoryOrderService;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::aggregates::{Order, User};
use schema::{CreateOrderRequest, UpdateStatusRequest, VerifyPaymentResponse};

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Upstream answered, but with a payload that fails boundary validation.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() { Self::Timeout } else { Self::Http(e) }
    }
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, request: &CreateOrderRequest, token: Option<&str>) -> Result<Order, RemoteError>;

    async fn get_all_orders(&self, token: &str) -> Result<Vec<Order>, RemoteError>;

    async fn update_order_status(&self, order_id: &str, request: &UpdateStatusRequest, token: &str) -> Result<Order, RemoteError>;
}

/// Server-side confirmation of a payment reference with the gateway.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify_payment(&self, reference: &str) -> Result<VerifyPaymentResponse, RemoteError>;
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn current_user(&self, token: &str) -> Result<User, RemoteError>;
}
