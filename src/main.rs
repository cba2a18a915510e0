//! OpenSASE Storefront - cart, checkout and order administration service

use anyhow::Result;
use opensase_storefront::domain::aggregates::{Role, User};
use opensase_storefront::publisher::EventPublisher;
use opensase_storefront::remote::{HttpOrderService, InMemoryOrderService};
use opensase_storefront::state::AppState;
use opensase_storefront::storage::{FileStore, KeyValueStore, PgStore};
use opensase_storefront::{routes, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let store: Arc<dyn KeyValueStore> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url).await?),
        None => Arc::new(FileStore::open(&config.cart_storage_dir).await?),
    };
    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let port = config.port;

    let state = match config.order_service_url.clone() {
        Some(url) => {
            tracing::info!(url = %url, "Using upstream order service");
            let backend = Arc::new(HttpOrderService::new(url, config.request_timeout)?);
            AppState::new(config, store, backend, events)
        }
        None => {
            tracing::warn!("ORDER_SERVICE_URL not set, running with the in-memory order service");
            let backend = Arc::new(if config.dev_auto_settle_payments { InMemoryOrderService::with_auto_settle() } else { InMemoryOrderService::new() });
            if let Some(token) = &config.dev_admin_token {
                backend.register_user(User { name: "Developer".into(), email: "dev@localhost".into(), role: Role::Admin, token: token.clone() });
            }
            AppState::new(config, store, backend, events)
        }
    };

    state.spawn_shopper_sweeper();
    let app = routes::router(state);
    tracing::info!("🚀 OpenSASE Storefront listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
