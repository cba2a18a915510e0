use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::checkout::{OrderQuote, PaymentNotice, PaymentRequest, Reconciliation};
use crate::domain::aggregates::Order;
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::CustomerInfo;
use crate::routes::bearer_token;
use crate::state::AppState;
use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest { pub customer_info: CustomerInfo }

#[derive(Debug, Serialize)]
pub struct CheckoutResponse { pub order: Order, pub quote: OrderQuote, pub payment: PaymentRequest }

#[derive(Debug, Deserialize)]
pub struct PaymentReport { pub reference: String }

pub async fn start_checkout(
    State(s): State<AppState>,
    Path(session): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let shopper = s.shopper(&session).await?;
    let mut shopper = shopper.lock().await;
    let shipping_fee = s.config.shipping_fee;
    let token = bearer_token(&headers).or_else(|| shopper.user.token()).map(str::to_string);

    let order = s.order_builder()
        .create_order(shopper.cart.cart(), &body.customer_info, shipping_fee, token.as_deref())
        .await?;
    s.events.publish(vec![OrderEvent::created(&order)]).await;

    let quote = OrderQuote::for_cart(shopper.cart.cart(), shipping_fee);
    let payment = shopper.reconciler.begin(order.clone(), body.customer_info.email.clone());
    Ok((StatusCode::CREATED, Json(CheckoutResponse { order, quote, payment })))
}

pub async fn confirm_payment(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(body): Json<PaymentReport>,
) -> Result<Json<Reconciliation>> {
    let shopper = s.shopper(&session).await?;
    let mut shopper = shopper.lock().await;
    let shopper = &mut *shopper;

    let outcome = shopper.reconciler.on_success(&body.reference, &mut shopper.cart).await;
    s.events.publish(shopper.reconciler.take_events()).await;
    let reconciliation = outcome?;
    // The confirmation screen is the client's to show; the session moves on now.
    shopper.reconciler.return_to_catalog();
    Ok(Json(reconciliation))
}

pub async fn close_payment(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<Option<PaymentNotice>>> {
    let shopper = s.shopper(&session).await?;
    let mut shopper = shopper.lock().await;
    let notice = shopper.reconciler.on_close();
    s.events.publish(shopper.reconciler.take_events()).await;
    Ok(Json(notice))
}
