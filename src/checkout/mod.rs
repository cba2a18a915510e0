//! Checkout: turning a cart into a pending order, then reconciling its payment.
mod builder;
mod reconciler;

pub use builder::{OrderBuilder, OrderQuote};
pub use reconciler::{CheckoutPhase, Confirmation, PaymentNotice, PaymentReconciler, PaymentRequest, Reconciliation};
