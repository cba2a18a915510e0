//! The signed-in user of a shopper session, kept in durable storage next to the cart.
//!
//! A missing or corrupt record means "signed out", never an error.

use std::sync::Arc;

use crate::domain::aggregates::User;
use crate::storage::{self, KeyValueStore};

pub struct UserSession {
    user: Option<User>,
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl UserSession {
    pub async fn load(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let user = storage::load_json::<User>(store.as_ref(), &key).await.filter(|u| !u.token.trim().is_empty());
        Self { user, store, key }
    }

    pub fn user(&self) -> Option<&User> { self.user.as_ref() }

    /// Token for authenticated order actions, when someone is signed in.
    pub fn token(&self) -> Option<&str> { self.user.as_ref().map(|u| u.token.as_str()) }

    pub async fn sign_in(&mut self, user: User) {
        if let Err(e) = storage::save_json(self.store.as_ref(), &self.key, &user).await {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist signed-in user");
        }
        self.user = Some(user);
    }

    /// Returns false when nobody was signed in.
    pub async fn sign_out(&mut self) -> bool {
        if self.user.take().is_none() { return false; }
        if let Err(e) = self.store.remove(&self.key).await {
            tracing::warn!(key = %self.key, error = %e, "Failed to forget signed-in user");
        }
        true
    }
}
