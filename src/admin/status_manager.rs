//! Admin order list and fulfillment status changes.
//!
//! The cache is refreshed wholesale from the order service and patched locally only
//! after a remote update succeeds. Any status may be set from any status; selecting
//! the current one is a no-op. Concurrent admins are last-write-wins upstream.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::admin::AdminSession;
use crate::domain::aggregates::{filter_orders, Order, OrderStatus, StatusFilter};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::remote::schema::UpdateStatusRequest;
use crate::remote::OrderService;
use crate::{Result, StorefrontError};

/// Order totals per status, for the filter tabs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub all: usize,
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
}

pub struct OrderStatusManager {
    service: Arc<dyn OrderService>,
    timeout: Duration,
    cache: Vec<Order>,
    events: Vec<DomainEvent>,
}

impl OrderStatusManager {
    pub fn new(service: Arc<dyn OrderService>, timeout: Duration) -> Self {
        Self { service, timeout, cache: Vec::new(), events: Vec::new() }
    }

    pub fn orders(&self) -> &[Order] { &self.cache }

    pub fn filtered(&self, filter: StatusFilter) -> Vec<&Order> { filter_orders(&self.cache, filter) }

    pub fn counts(&self) -> StatusCounts {
        self.cache.iter().fold(StatusCounts { all: self.cache.len(), ..Default::default() }, |mut c, o| {
            match o.status {
                OrderStatus::Pending => c.pending += 1,
                OrderStatus::Processing => c.processing += 1,
                OrderStatus::Shipped => c.shipped += 1,
                OrderStatus::Delivered => c.delivered += 1,
                OrderStatus::Cancelled => c.cancelled += 1,
            }
            c
        })
    }

    /// Replaces the cache with the order service's current list.
    ///
    /// # Errors
    ///
    /// `OrderFetch` on upstream failure or timeout; the cache is kept.
    pub async fn refresh(&mut self, session: &AdminSession) -> Result<&[Order]> {
        let orders = match tokio::time::timeout(self.timeout, self.service.get_all_orders(session.token())).await {
            Err(_) => Err("request timed out".to_string()),
            Ok(result) => result.map_err(|e| e.to_string()),
        }
        .map_err(|reason| {
            tracing::warn!(admin = %session.user().email, reason = %reason, "Order list refresh failed");
            StorefrontError::OrderFetch(reason)
        })?;
        tracing::debug!(count = orders.len(), "Order cache refreshed");
        self.cache = orders;
        Ok(&self.cache)
    }

    /// Persists `status` upstream, then patches the cached copy.
    ///
    /// # Errors
    ///
    /// `StatusUpdate` on upstream failure or timeout; the cache is left unchanged and
    /// nothing is retried.
    pub async fn set_status(&mut self, session: &AdminSession, order_id: &str, status: OrderStatus) -> Result<Order> {
        let previous = self.cache.iter().find(|o| o.id == order_id).map(|o| o.status);
        if previous == Some(status) {
            if let Some(order) = self.cache.iter().find(|o| o.id == order_id) {
                return Ok(order.clone());
            }
        }

        let request = UpdateStatusRequest { status };
        let updated = match tokio::time::timeout(self.timeout, self.service.update_order_status(order_id, &request, session.token())).await {
            Err(_) => Err("request timed out".to_string()),
            Ok(result) => result.map_err(|e| e.to_string()),
        }
        .map_err(|reason| {
            tracing::warn!(order_id, status = %status, reason = %reason, "Order status update failed");
            StorefrontError::StatusUpdate(reason)
        })?;

        if let Some(cached) = self.cache.iter_mut().find(|o| o.id == updated.id) {
            *cached = updated.clone();
        }
        tracing::info!(order_id, from = ?previous, to = %updated.status, admin = %session.user().email, "Order status changed");
        self.events.push(DomainEvent::Order(OrderEvent::StatusChanged { order_id: updated.id.clone(), from: previous, to: updated.status }));
        Ok(updated)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
}
