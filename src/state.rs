//! Shared application state for the HTTP surface.
//!
//! Shopper sessions are a memory cache over durable storage: cart and signed-in user are
//! written through on every change, so an evicted session rehydrates on its next request.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::admin::OrderStatusManager;
use crate::cart_store::CartStore;
use crate::checkout::{OrderBuilder, PaymentReconciler};
use crate::config::Config;
use crate::publisher::EventPublisher;
use crate::remote::{IdentityService, OrderService, PaymentVerifier};
use crate::storage::{KeyValueStore, CART_STORAGE_KEY, USER_STORAGE_KEY};
use crate::user_session::UserSession;
use crate::{Result, StorefrontError};

const MAX_SESSION_ID_LEN: usize = 128;

/// One shopper's cart, sign-in and checkout. Single logical owner; the mutex serializes requests.
pub struct ShopperSession {
    pub cart: CartStore,
    pub user: UserSession,
    pub reconciler: PaymentReconciler,
}

pub type Shared<T> = Arc<Mutex<T>>;

struct ShopperEntry {
    session: Shared<ShopperSession>,
    touched: Instant,
}

impl ShopperEntry {
    /// A handler still holds the session.
    fn in_use(&self) -> bool { Arc::strong_count(&self.session) > 1 }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn KeyValueStore>,
    pub orders: Arc<dyn OrderService>,
    pub payments: Arc<dyn PaymentVerifier>,
    pub identity: Arc<dyn IdentityService>,
    pub events: EventPublisher,
    shoppers: Shared<HashMap<String, ShopperEntry>>,
    admins: Shared<HashMap<String, Shared<OrderStatusManager>>>,
}

impl AppState {
    pub fn new<B>(config: Config, store: Arc<dyn KeyValueStore>, backend: Arc<B>, events: EventPublisher) -> Self
    where
        B: OrderService + PaymentVerifier + IdentityService + 'static,
    {
        Self {
            config: Arc::new(config),
            store,
            orders: backend.clone(),
            payments: backend.clone(),
            identity: backend,
            events,
            shoppers: Arc::default(),
            admins: Arc::default(),
        }
    }

    pub fn order_builder(&self) -> OrderBuilder { OrderBuilder::new(self.orders.clone()) }

    /// The shopper session for `session_id`, rehydrating it from storage on first use.
    pub async fn shopper(&self, session_id: &str) -> Result<Shared<ShopperSession>> {
        if let Some(existing) = self.existing_shopper(session_id).await? {
            return Ok(existing);
        }

        let cart = CartStore::load(self.store.clone(), cart_key(session_id)).await;
        let user = UserSession::load(self.store.clone(), user_key(session_id)).await;
        let reconciler = PaymentReconciler::new(self.payments.clone(), self.config.request_timeout, self.config.confirmation_display);
        let fresh = Arc::new(Mutex::new(ShopperSession { cart, user, reconciler }));

        let now = Instant::now();
        let mut shoppers = self.shoppers.lock().await;
        if !shoppers.contains_key(session_id) && shoppers.len() >= self.config.max_shopper_sessions {
            let evicted = evict(&mut shoppers, now, self.config.shopper_idle, self.config.max_shopper_sessions - 1);
            tracing::debug!(evicted, "Shopper session cap reached");
        }
        let entry = shoppers.entry(session_id.to_string()).or_insert(ShopperEntry { session: fresh, touched: now });
        entry.touched = now;
        Ok(entry.session.clone())
    }

    /// The in-memory session for `session_id`, without creating one.
    pub async fn existing_shopper(&self, session_id: &str) -> Result<Option<Shared<ShopperSession>>> {
        validate_session_id(session_id)?;
        Ok(self.shoppers.lock().await.get_mut(session_id).map(|entry| {
            entry.touched = Instant::now();
            entry.session.clone()
        }))
    }

    /// The stored cart snapshot, for reads that should not allocate a session.
    pub async fn stored_cart(&self, session_id: &str) -> Result<CartStore> {
        validate_session_id(session_id)?;
        Ok(CartStore::load(self.store.clone(), cart_key(session_id)).await)
    }

    pub async fn stored_user(&self, session_id: &str) -> Result<UserSession> {
        validate_session_id(session_id)?;
        Ok(UserSession::load(self.store.clone(), user_key(session_id)).await)
    }

    pub async fn shopper_count(&self) -> usize { self.shoppers.lock().await.len() }

    /// Drops sessions idle for longer than the configured window. Returns how many went.
    pub async fn evict_idle_shoppers(&self) -> usize {
        let mut shoppers = self.shoppers.lock().await;
        evict(&mut shoppers, Instant::now(), self.config.shopper_idle, self.config.max_shopper_sessions)
    }

    /// Runs [`AppState::evict_idle_shoppers`] periodically for the life of the process.
    pub fn spawn_shopper_sweeper(&self) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval((state.config.shopper_idle / 2).max(Duration::from_secs(1)));
            loop {
                tick.tick().await;
                let evicted = state.evict_idle_shoppers().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "Idle shopper sessions dropped");
                }
            }
        })
    }

    /// The order cache of one administrator.
    pub async fn admin_manager(&self, admin_email: &str) -> Shared<OrderStatusManager> {
        self.admins.lock().await
            .entry(admin_email.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(OrderStatusManager::new(self.orders.clone(), self.config.request_timeout))))
            .clone()
    }
}

fn cart_key(session_id: &str) -> String { format!("{CART_STORAGE_KEY}:{session_id}") }
fn user_key(session_id: &str) -> String { format!("{USER_STORAGE_KEY}:{session_id}") }

/// Removes idle entries, then the least recently touched ones until at most `keep` remain.
/// Sessions a handler is holding are never removed.
fn evict(shoppers: &mut HashMap<String, ShopperEntry>, now: Instant, idle: Duration, keep: usize) -> usize {
    let before = shoppers.len();
    shoppers.retain(|_, e| e.in_use() || now.duration_since(e.touched) < idle);
    if shoppers.len() > keep {
        let excess = shoppers.len() - keep;
        let mut oldest: Vec<(Instant, String)> = shoppers.iter()
            .filter(|(_, e)| !e.in_use())
            .map(|(k, e)| (e.touched, k.clone()))
            .collect();
        oldest.sort();
        for (_, key) in oldest.into_iter().take(excess) {
            shoppers.remove(&key);
        }
    }
    before - shoppers.len()
}

fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid { Ok(()) } else { Err(StorefrontError::InvalidRequest("malformed session id".into())) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Product;
    use crate::domain::value_objects::Money;
    use crate::remote::InMemoryOrderService;
    use crate::storage::MemoryStore;

    fn state(max_sessions: &str) -> AppState {
        let max_sessions = max_sessions.to_string();
        let config = Config::from_lookup(|k| match k {
            "SHOPPER_IDLE_SECS" => Some("60".into()),
            "MAX_SHOPPER_SESSIONS" => Some(max_sessions.clone()),
            _ => None,
        }).unwrap();
        AppState::new(config, Arc::new(MemoryStore::new()), Arc::new(InMemoryOrderService::new()), EventPublisher::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_evicted_session_rehydrates_its_cart() {
        let state = state("100");
        {
            let shopper = state.shopper("s1").await.unwrap();
            shopper.lock().await.cart.add(&Product::new("p1", "Widget", Money::from_minor(5000))).await.unwrap();
        }
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(state.evict_idle_shoppers().await, 0);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(state.evict_idle_shoppers().await, 1);
        assert_eq!(state.shopper_count().await, 0);

        let shopper = state.shopper("s1").await.unwrap();
        assert_eq!(shopper.lock().await.cart.total(), Money::from_minor(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_drops_least_recently_used_but_not_busy_sessions() {
        let state = state("2");
        let busy = state.shopper("a").await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        drop(state.shopper("b").await.unwrap());
        tokio::time::advance(Duration::from_secs(1)).await;
        drop(state.shopper("c").await.unwrap());

        assert_eq!(state.shopper_count().await, 2);
        assert!(state.existing_shopper("a").await.unwrap().is_some());
        assert!(state.existing_shopper("b").await.unwrap().is_none());
        drop(busy);
    }

    #[tokio::test]
    async fn test_stored_reads_do_not_create_sessions() {
        let state = state("100");
        assert!(state.stored_cart("visitor").await.unwrap().is_empty());
        assert!(state.stored_user("visitor").await.unwrap().user().is_none());
        assert!(state.existing_shopper("visitor").await.unwrap().is_none());
        assert_eq!(state.shopper_count().await, 0);
        assert!(state.stored_cart("bad id").await.is_err());
    }
}
