use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::admin::{AdminGuard, AdminSession, StatusCounts};
use crate::domain::aggregates::{Order, StatusFilter, UnknownStatus};
use crate::remote::schema::UpdateStatusRequest;
use crate::routes::{bearer_token, resolve_user};
use crate::state::AppState;
use crate::{Result, StorefrontError};

#[derive(Debug, Deserialize)]
pub struct ListParams { pub status: Option<String> }

/// Resolves the caller through the identity service, then applies the admin guard.
async fn authorize(s: &AppState, headers: &HeaderMap) -> Result<AdminSession> {
    let Some(token) = bearer_token(headers) else { return AdminGuard::authorize(None) };
    let user = resolve_user(s, token).await?;
    AdminGuard::authorize(Some(&user))
}

pub async fn list_orders(State(s): State<AppState>, headers: HeaderMap, Query(p): Query<ListParams>) -> Result<Json<Vec<Order>>> {
    let session = authorize(&s, &headers).await?;
    let filter: StatusFilter = match p.status.as_deref() {
        None => StatusFilter::All,
        Some(raw) => raw.parse::<StatusFilter>().map_err(|e: UnknownStatus| StorefrontError::InvalidRequest(e.to_string()))?,
    };
    let manager = s.admin_manager(&session.user().email).await;
    let mut manager = manager.lock().await;
    manager.refresh(&session).await?;
    Ok(Json(manager.filtered(filter).into_iter().cloned().collect()))
}

pub async fn summary(State(s): State<AppState>, headers: HeaderMap) -> Result<Json<StatusCounts>> {
    let session = authorize(&s, &headers).await?;
    let manager = s.admin_manager(&session.user().email).await;
    let mut manager = manager.lock().await;
    manager.refresh(&session).await?;
    Ok(Json(manager.counts()))
}

pub async fn update_status(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let session = authorize(&s, &headers).await?;
    let manager = s.admin_manager(&session.user().email).await;
    let mut manager = manager.lock().await;
    // Another admin may have moved the order since this cache was filled.
    manager.refresh(&session).await?;
    let result = manager.set_status(&session, &id, body.status).await;
    s.events.publish(manager.take_events()).await;
    Ok(Json(result?))
}
