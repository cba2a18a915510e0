use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::domain::aggregates::{Order, User};
use super::schema::{ApiErrorBody, CreateOrderRequest, OrderEnvelope, OrderListEnvelope, UpdateStatusRequest, VerifyPaymentResponse};
use super::{IdentityService, OrderService, PaymentVerifier, RemoteError};

/// JSON client for the upstream order, payment and identity endpoints.
#[derive(Clone, Debug)]
pub struct HttpOrderService {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpOrderService {
    /// # Errors
    ///
    /// Returns error if `base_url` is not an http(s) URL or the HTTP client fails to build.
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, RemoteError> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|e| RemoteError::InvalidBaseUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Appends `segments` to the base path, percent-encoding each one so ids and
    /// references can never change the route.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, token: Option<&str>) -> Result<T, RemoteError> {
        let request = match token { Some(token) => request.bearer_auth(token), None => request };
        decode(request.send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| if body.trim().is_empty() { status.to_string() } else { body });
        return Err(RemoteError::Api { status: status.as_u16(), message });
    }
    serde_json::from_str(&body).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl OrderService for HttpOrderService {
    async fn create_order(&self, request: &CreateOrderRequest, token: Option<&str>) -> Result<Order, RemoteError> {
        let envelope: OrderEnvelope = self.send(self.client.post(self.url(&["api", "orders"])).json(request), token).await?;
        envelope.try_into()
    }

    async fn get_all_orders(&self, token: &str) -> Result<Vec<Order>, RemoteError> {
        let envelope: OrderListEnvelope = self.send(self.client.get(self.url(&["api", "orders"])), Some(token)).await?;
        envelope.into_orders()
    }

    async fn update_order_status(&self, order_id: &str, request: &UpdateStatusRequest, token: &str) -> Result<Order, RemoteError> {
        let url = self.url(&["api", "orders", order_id, "status"]);
        let envelope: OrderEnvelope = self.send(self.client.put(url).json(request), Some(token)).await?;
        envelope.try_into()
    }
}

#[async_trait]
impl PaymentVerifier for HttpOrderService {
    async fn verify_payment(&self, reference: &str) -> Result<VerifyPaymentResponse, RemoteError> {
        let url = self.url(&["api", "payment", "verify", reference]);
        self.send(self.client.get(url), None).await
    }
}

#[async_trait]
impl IdentityService for HttpOrderService {
    async fn current_user(&self, token: &str) -> Result<User, RemoteError> {
        let mut user: User = self.send(self.client.get(self.url(&["api", "auth", "me"])), Some(token)).await?;
        if user.token.is_empty() { user.token = token.to_string(); }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{OrderStatus, Role};
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn order_json(id: &str, status: &str) -> Value {
        json!({
            "_id": id, "orderNumber": "ORD-7", "totalAmount": 7500, "status": status,
            "paymentStatus": "pending", "paymentReference": "ref-7", "createdAt": "2024-05-01T10:00:00Z",
            "customerInfo": {"fullName":"Ada","email":"ada@example.com","phone":"080","address":"1 Rd","city":"Lagos","state":"Lagos"},
            "items": [{"productId":"p1","name":"Widget","price":5000,"quantity":1}],
        })
    }

    async fn upstream() -> String {
        let app = Router::new()
            .route("/api/orders", get(|headers: HeaderMap| async move {
                if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer admin-token") {
                    return Err((StatusCode::FORBIDDEN, Json(json!({"message": "Admin access required"}))));
                }
                Ok(Json(json!({"orders": [order_json("o1", "pending")]})))
            }))
            .route("/api/orders/:id/status", put(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                let status = body["status"].as_str().unwrap_or_default().to_string();
                Json(json!({"order": order_json(&id, &status)}))
            }))
            .route("/api/payment/verify/:reference", get(|Path(reference): Path<String>| async move {
                Json(json!({"success": reference == "good"}))
            }))
            .route("/api/auth/me", get(|| async { Json(json!({"name": "Root", "email": "root@example.com", "role": "admin", "token": ""})) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/")
    }

    #[test]
    fn test_path_segments_are_encoded() {
        let service = HttpOrderService::new("http://orders.internal/v2/", Duration::from_secs(1)).unwrap();
        let url = service.url(&["api", "orders", "a%2F..%2Fx", "status"]);
        assert_eq!(url.path(), "/v2/api/orders/a%252F..%252Fx/status");
        assert_eq!(service.url(&["api", "orders", "a/../x"]).path(), "/v2/api/orders/a%2F..%2Fx");
        assert!(matches!(HttpOrderService::new("not a url", Duration::from_secs(1)), Err(RemoteError::InvalidBaseUrl(_))));
    }

    #[tokio::test]
    async fn test_talks_to_upstream() {
        let service = HttpOrderService::new(upstream().await, Duration::from_secs(5)).unwrap();

        let orders = service.get_all_orders("admin-token").await.unwrap();
        assert_eq!(orders[0].id, "o1");

        let err = service.get_all_orders("nope").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Admin access required");

        let updated = service.update_order_status("o1", &UpdateStatusRequest { status: OrderStatus::Shipped }, "admin-token").await.unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);

        assert!(service.verify_payment("good").await.unwrap().success);
        assert!(!service.verify_payment("bad").await.unwrap().success);

        let odd = service.update_order_status("a/../x", &UpdateStatusRequest { status: OrderStatus::Pending }, "admin-token").await.unwrap();
        assert_eq!(odd.id, "a/../x");

        let user = service.current_user("admin-token").await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.token, "admin-token");
    }
}
