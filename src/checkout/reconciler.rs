//! Payment reconciliation.
//!
//! The payment widget's success callback is untrusted: it only starts a server-side
//! verification. The cart is cleared, at most once per reference, after the order
//! service confirms the payment with the gateway.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cart_store::CartStore;
use crate::domain::aggregates::Order;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Money;
use crate::remote::PaymentVerifier;
use crate::{Result, StorefrontError};

/// What the payment widget is opened with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Money,
    pub reference: String,
    pub email: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    #[default]
    Idle,
    AwaitingPayment,
    Verifying,
    Confirmed,
    Catalog,
}

/// Non-fatal outcome of the shopper closing the widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum PaymentNotice {
    Cancelled { order_id: String, reference: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub order_id: String,
    pub order_number: String,
    pub reference: String,
    /// How long the confirmation stays up before returning to the catalog.
    #[serde(rename = "displayForMs", serialize_with = "as_millis")]
    pub display_for: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reconciliation {
    Confirmed(Confirmation),
    /// The reference was already confirmed; nothing happened this time.
    AlreadyConfirmed { reference: String },
}

#[derive(Debug)]
struct CheckoutSession {
    order: Order,
    reference: String,
}

pub struct PaymentReconciler {
    verifier: Arc<dyn PaymentVerifier>,
    timeout: Duration,
    display_for: Duration,
    session: Option<CheckoutSession>,
    phase: CheckoutPhase,
    confirmed: HashSet<String>,
    events: Vec<DomainEvent>,
}

impl PaymentReconciler {
    pub fn new(verifier: Arc<dyn PaymentVerifier>, timeout: Duration, display_for: Duration) -> Self {
        Self {
            verifier, timeout, display_for, session: None, phase: CheckoutPhase::Idle,
            confirmed: HashSet::new(), events: Vec::new(),
        }
    }

    pub fn phase(&self) -> CheckoutPhase { self.phase }
    pub fn pending_order(&self) -> Option<&Order> { self.session.as_ref().map(|s| &s.order) }

    /// Opens a checkout session for `order`. A session that was never confirmed is
    /// replaced, which is how a shopper retries checkout.
    pub fn begin(&mut self, order: Order, email: impl Into<String>) -> PaymentRequest {
        let request = PaymentRequest { amount: order.total_amount, reference: order.payment_reference.clone(), email: email.into() };
        if let Some(previous) = self.session.replace(CheckoutSession { reference: request.reference.clone(), order }) {
            tracing::info!(order_id = %previous.order.id, "Replacing unconfirmed checkout session");
        }
        self.phase = CheckoutPhase::AwaitingPayment;
        request
    }

    /// Widget closed before completing. The order stays pending and nothing is discarded.
    pub fn on_close(&mut self) -> Option<PaymentNotice> {
        let session = self.session.as_ref()?;
        if self.phase != CheckoutPhase::AwaitingPayment { return None; }
        tracing::info!(order_id = %session.order.id, "Payment window closed by shopper");
        self.events.push(DomainEvent::Order(OrderEvent::PaymentCancelled {
            order_id: session.order.id.clone(), reference: session.reference.clone(),
        }));
        Some(PaymentNotice::Cancelled { order_id: session.order.id.clone(), reference: session.reference.clone() })
    }

    /// Widget reported success for `reference`. Verifies it server-side and, on a
    /// verified success, clears the cart.
    ///
    /// # Errors
    ///
    /// `PaymentVerification` when the reference is not the open session's, when the
    /// verifier says no, fails, or exceeds the timeout. Cart and order are untouched.
    pub async fn on_success(&mut self, reference: &str, cart: &mut CartStore) -> Result<Reconciliation> {
        if self.confirmed.contains(reference) {
            tracing::debug!(reference, "Duplicate payment confirmation ignored");
            return Ok(Reconciliation::AlreadyConfirmed { reference: reference.to_string() });
        }
        let (order_id, order_number) = match &self.session {
            Some(s) if s.reference == reference => (s.order.id.clone(), s.order.order_number.clone()),
            _ => {
                tracing::warn!(reference, "Payment reported for a reference outside the open checkout");
                return Err(StorefrontError::PaymentVerification("unknown payment reference".into()));
            }
        };

        self.phase = CheckoutPhase::Verifying;
        let outcome = match tokio::time::timeout(self.timeout, self.verifier.verify_payment(reference)).await {
            Err(_) => Err("verification timed out".to_string()),
            Ok(Err(e)) => Err(e.to_string()),
            Ok(Ok(response)) if !response.success => {
                Err(response.message.unwrap_or_else(|| "payment was not successful".into()))
            }
            Ok(Ok(_)) => Ok(()),
        };

        if let Err(reason) = outcome {
            tracing::warn!(order_id = %order_id, reference, reason = %reason, "Payment verification failed");
            self.phase = CheckoutPhase::AwaitingPayment;
            self.events.push(DomainEvent::Order(OrderEvent::PaymentVerificationFailed {
                order_id, reference: reference.to_string(), reason: reason.clone(),
            }));
            return Err(StorefrontError::PaymentVerification(reason));
        }

        self.confirmed.insert(reference.to_string());
        cart.clear().await;
        self.phase = CheckoutPhase::Confirmed;
        self.events.push(DomainEvent::Order(OrderEvent::PaymentConfirmed { order_id: order_id.clone(), reference: reference.to_string() }));
        tracing::info!(order_id = %order_id, reference, "Payment confirmed");

        Ok(Reconciliation::Confirmed(Confirmation {
            order_id, order_number, reference: reference.to_string(), display_for: self.display_for,
        }))
    }

    /// Leaves the confirmation state for the catalog and ends the session.
    pub fn return_to_catalog(&mut self) {
        if self.phase == CheckoutPhase::Confirmed {
            self.session = None;
            self.phase = CheckoutPhase::Catalog;
        }
    }

    /// Holds the confirmation for its display duration, then returns to the catalog.
    pub async fn finish_confirmation(&mut self) {
        if self.phase != CheckoutPhase::Confirmed { return; }
        tokio::time::sleep(self.display_for).await;
        self.return_to_catalog();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
}
