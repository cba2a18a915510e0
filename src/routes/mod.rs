//! HTTP routes.

mod admin;
mod cart;
mod checkout;
mod session;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::aggregates::User;
use crate::state::AppState;
use crate::{Result, StorefrontError};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-storefront"})) }))
        .route("/api/v1/cart/:session", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/v1/cart/:session/items", post(cart::add_item))
        .route("/api/v1/cart/:session/items/:product_id", patch(cart::update_item).delete(cart::remove_item))
        .route("/api/v1/session/:session/user", get(session::current_user).put(session::sign_in).delete(session::sign_out))
        .route("/api/v1/checkout/:session", post(checkout::start_checkout))
        .route("/api/v1/checkout/:session/payment", post(checkout::confirm_payment))
        .route("/api/v1/checkout/:session/close", post(checkout::close_payment))
        .route("/api/v1/admin/orders", get(admin::list_orders))
        .route("/api/v1/admin/orders/summary", get(admin::summary))
        .route("/api/v1/admin/orders/:id/status", put(admin::update_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::EmptyCart | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCustomerInfo(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PaymentVerification(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::OrderCreation(_) | Self::StatusUpdate(_) | Self::OrderFetch(_) | Self::IdentityUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::StorageCorruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?
        .to_str().ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves a bearer token through the identity service. A rejected token is an
/// authorization failure; an unreachable or failing service is an upstream failure.
pub(crate) async fn resolve_user(s: &AppState, token: &str) -> Result<User> {
    let outcome = match tokio::time::timeout(s.config.request_timeout, s.identity.current_user(token)).await {
        Err(_) => Err(crate::remote::RemoteError::Timeout),
        Ok(result) => result,
    };
    outcome.map_err(|e| {
        if e.is_unauthorized() {
            tracing::warn!(error = %e, "Identity service rejected token");
            StorefrontError::Authorization("invalid or expired session".into())
        } else {
            tracing::error!(error = %e, "Identity lookup failed");
            StorefrontError::IdentityUnavailable(e.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(StorefrontError::EmptyCart.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(StorefrontError::Authorization("x".into()).into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(StorefrontError::PaymentVerification("x".into()).into_response().status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(StorefrontError::IdentityUnavailable("x".into()).into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
