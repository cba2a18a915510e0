//! Durable key/value storage for client-side state (cart snapshot, signed-in user).
//!
//! Storage is best-effort: a missing or undecodable value degrades to "nothing stored",
//! never to a failure the shopper sees.

mod file;
mod memory;
mod postgres;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::StorefrontError;

/// Fixed key of the cart snapshot.
pub const CART_STORAGE_KEY: &str = "cart";
/// Fixed key of the persisted signed-in user.
pub const USER_STORAGE_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads and decodes `key`. Unreadable or corrupt data is logged and treated as absent.
pub async fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Storage read failed, falling back to empty state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            let err = StorefrontError::StorageCorruption(format!("{key}: {e}"));
            tracing::warn!(key, error = %err, "Discarding corrupt stored value");
            None
        }
    }
}

/// Encodes `value` and writes it under `key`.
pub async fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Role, User};

    #[tokio::test]
    async fn test_load_json_degrades_on_corruption() {
        let store = MemoryStore::new();
        store.set(USER_STORAGE_KEY, "{not json").await.unwrap();
        assert!(load_json::<User>(&store, USER_STORAGE_KEY).await.is_none());
        assert!(load_json::<User>(&store, "absent").await.is_none());
    }

    #[tokio::test]
    async fn test_user_survives_reload() {
        let store = MemoryStore::new();
        let user = User { name: "Admin".into(), email: "admin@example.com".into(), role: Role::Admin, token: "tok".into() };
        save_json(&store, USER_STORAGE_KEY, &user).await.unwrap();
        let loaded: Option<User> = load_json(&store, USER_STORAGE_KEY).await;
        assert_eq!(loaded, Some(user));
    }
}
