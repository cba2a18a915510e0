use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

use crate::domain::aggregates::{Role, User};
use crate::routes::{bearer_token, resolve_user};
use crate::state::AppState;
use crate::{Result, StorefrontError};

/// The signed-in user without the session token.
#[derive(Debug, Serialize)]
pub struct UserView { pub name: String, pub email: String, pub role: Role }

impl From<&User> for UserView {
    fn from(u: &User) -> Self { Self { name: u.name.clone(), email: u.email.clone(), role: u.role } }
}

pub async fn current_user(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<Option<UserView>>> {
    let Some(shopper) = s.existing_shopper(&session).await? else {
        let stored = s.stored_user(&session).await?;
        return Ok(Json(stored.user().map(UserView::from)));
    };
    let shopper = shopper.lock().await;
    Ok(Json(shopper.user.user().map(UserView::from)))
}

/// Resolves the bearer token and remembers the user for this shopper session.
pub async fn sign_in(State(s): State<AppState>, Path(session): Path<String>, headers: HeaderMap) -> Result<Json<UserView>> {
    let token = bearer_token(&headers).ok_or_else(|| StorefrontError::Authorization("sign in required".into()))?;
    let user = resolve_user(&s, token).await?;
    let view = UserView::from(&user);
    let shopper = s.shopper(&session).await?;
    shopper.lock().await.user.sign_in(user).await;
    tracing::info!(email = %view.email, "Shopper signed in");
    Ok(Json(view))
}

pub async fn sign_out(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode> {
    let shopper = s.shopper(&session).await?;
    shopper.lock().await.user.sign_out().await;
    Ok(StatusCode::NO_CONTENT)
}
