//! Cart store: the shopper's cart plus its durable snapshot.
//!
//! Every effective mutation is followed by a write of the full snapshot under a fixed
//! key. Loading never fails; a missing or corrupt snapshot yields an empty cart.

use std::sync::Arc;
use tokio::sync::broadcast;
use validator::Validate;

use crate::domain::aggregates::{Cart, CartItem, Product};
use crate::domain::value_objects::Money;
use crate::storage::{self, KeyValueStore};
use crate::{Result, StorefrontError};

const SIGNAL_CAPACITY: usize = 16;

/// Advisory notifications for the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CartSignal {
    /// An item was added; the cart drawer should open.
    ShowCart,
    Changed,
}

pub struct CartStore {
    cart: Cart,
    store: Arc<dyn KeyValueStore>,
    key: String,
    signals: broadcast::Sender<CartSignal>,
}

impl CartStore {
    pub async fn load(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart: Cart = storage::load_json(store.as_ref(), &key).await.unwrap_or_default();
        tracing::debug!(key = %key, items = cart.items().len(), "Cart rehydrated");
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { cart, store, key, signals }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CartSignal> { self.signals.subscribe() }

    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn items(&self) -> &[CartItem] { self.cart.items() }
    pub fn total(&self) -> Money { self.cart.total() }
    pub fn item_count(&self) -> u64 { self.cart.item_count() }
    pub fn is_empty(&self) -> bool { self.cart.is_empty() }

    /// # Errors
    ///
    /// `InvalidRequest` for a product with a blank id or a negative price; the cart is
    /// left as it was.
    pub async fn add(&mut self, product: &Product) -> Result<()> {
        product.validate().map_err(|e| StorefrontError::InvalidRequest(format!("invalid product: {e}")))?;
        self.cart.add_item(product);
        self.persist().await;
        self.signal(CartSignal::ShowCart);
        self.signal(CartSignal::Changed);
        Ok(())
    }

    /// Returns false (and writes nothing) when `id` is not in the cart.
    pub async fn update_quantity(&mut self, id: &str, delta: i64) -> bool {
        if !self.cart.update_quantity(id, delta) { return false; }
        self.persist().await;
        self.signal(CartSignal::Changed);
        true
    }

    pub async fn remove(&mut self, id: &str) -> bool {
        if !self.cart.remove_item(id) { return false; }
        self.persist().await;
        self.signal(CartSignal::Changed);
        true
    }

    pub async fn clear(&mut self) {
        if self.cart.is_empty() { return; }
        self.cart.clear();
        self.persist().await;
        self.signal(CartSignal::Changed);
    }

    async fn persist(&self) {
        if let Err(e) = storage::save_json(self.store.as_ref(), &self.key, &self.cart).await {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist cart snapshot");
        }
    }

    fn signal(&self, signal: CartSignal) {
        // No subscribers is fine.
        let _ = self.signals.send(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError, CART_STORAGE_KEY};
    use async_trait::async_trait;

    fn product(id: &str, price: i64) -> Product { Product::new(id, id.to_uppercase(), Money::from_minor(price)) }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = CartStore::load(store.clone(), CART_STORAGE_KEY).await;
        cart.add(&product("p1", 1000)).await.unwrap();
        cart.add(&product("p1", 1000)).await.unwrap();
        cart.add(&product("p2", 500)).await.unwrap();
        cart.update_quantity("p2", -3).await;

        let reloaded = CartStore::load(store.clone(), CART_STORAGE_KEY).await;
        assert_eq!(reloaded.items(), cart.items());
        assert_eq!(reloaded.total(), Money::from_minor(2500));

        cart.remove("p1").await;
        cart.clear().await;
        assert_eq!(store.raw(CART_STORAGE_KEY).as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_noop_edits_skip_the_write() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = CartStore::load(store.clone(), CART_STORAGE_KEY).await;
        assert!(!cart.update_quantity("ghost", 1).await);
        assert!(!cart.remove("ghost").await);
        assert!(store.raw(CART_STORAGE_KEY).is_none());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_loads_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(CART_STORAGE_KEY, "[{\"id\":").await.unwrap();
        let cart = CartStore::load(store, CART_STORAGE_KEY).await;
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::ZERO);
    }

    #[tokio::test]
    async fn test_add_signals_show_cart() {
        let mut cart = CartStore::load(Arc::new(MemoryStore::new()), CART_STORAGE_KEY).await;
        let mut rx = cart.subscribe();
        cart.add(&product("p1", 100)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), CartSignal::ShowCart);
        assert_eq!(rx.recv().await.unwrap(), CartSignal::Changed);
    }

    #[tokio::test]
    async fn test_negative_price_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = CartStore::load(store.clone(), CART_STORAGE_KEY).await;
        let mut rx = cart.subscribe();
        let err = cart.add(&product("p1", -5000)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidRequest(_)));
        assert!(cart.is_empty());
        assert!(store.raw(CART_STORAGE_KEY).is_none());
        assert!(rx.try_recv().is_err());
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> std::result::Result<Option<String>, StorageError> {
            Err(std::io::Error::other("disk gone").into())
        }
        async fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Err(std::io::Error::other("disk gone").into())
        }
        async fn remove(&self, _key: &str) -> std::result::Result<(), StorageError> { Ok(()) }
    }

    #[tokio::test]
    async fn test_storage_failures_are_not_fatal() {
        let mut cart = CartStore::load(Arc::new(BrokenStore), CART_STORAGE_KEY).await;
        cart.add(&product("p1", 100)).await.unwrap();
        assert_eq!(cart.item_count(), 1);
    }
}
