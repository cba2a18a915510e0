use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::cart_store::CartStore;
use crate::domain::aggregates::{CartItem, Product};
use crate::domain::value_objects::Money;
use crate::state::AppState;
use crate::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Money,
    pub item_count: u64,
}

impl From<&CartStore> for CartView {
    fn from(cart: &CartStore) -> Self {
        Self { items: cart.items().to_vec(), total: cart.total(), item_count: cart.item_count() }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuantityDelta { pub delta: i64 }

pub async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<CartView>> {
    // Reading an unknown session serves the stored snapshot without allocating a session.
    let Some(shopper) = s.existing_shopper(&session).await? else {
        let stored = s.stored_cart(&session).await?;
        return Ok(Json(CartView::from(&stored)));
    };
    let shopper = shopper.lock().await;
    Ok(Json(CartView::from(&shopper.cart)))
}

pub async fn add_item(State(s): State<AppState>, Path(session): Path<String>, Json(product): Json<Product>) -> Result<Json<CartView>> {
    let shopper = s.shopper(&session).await?;
    let mut shopper = shopper.lock().await;
    shopper.cart.add(&product).await?;
    Ok(Json(CartView::from(&shopper.cart)))
}

pub async fn update_item(
    State(s): State<AppState>,
    Path((session, product_id)): Path<(String, String)>,
    Json(body): Json<QuantityDelta>,
) -> Result<Json<CartView>> {
    let shopper = s.shopper(&session).await?;
    let mut shopper = shopper.lock().await;
    shopper.cart.update_quantity(&product_id, body.delta).await;
    Ok(Json(CartView::from(&shopper.cart)))
}

pub async fn remove_item(State(s): State<AppState>, Path((session, product_id)): Path<(String, String)>) -> Result<Json<CartView>> {
    let shopper = s.shopper(&session).await?;
    let mut shopper = shopper.lock().await;
    shopper.cart.remove(&product_id).await;
    Ok(Json(CartView::from(&shopper.cart)))
}

pub async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode> {
    let shopper = s.shopper(&session).await?;
    shopper.lock().await.cart.clear().await;
    Ok(StatusCode::NO_CONTENT)
}
