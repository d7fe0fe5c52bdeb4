#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use herald_api::{AppState, AppStateInner, router};
use herald_auth::TokenKeys;
use herald_db::Database;

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let keys = TokenKeys::new("integration-test-secret", chrono::Duration::hours(24));
        let state = AppStateInner::new(db, keys);
        let router = router(state.clone());
        Self { state, router }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Register and log in, returning `(user_id, token)`.
    pub async fn signup(&self, username: &str, password: &str) -> (i64, String) {
        let creds = serde_json::json!({ "username": username, "password": password });

        let (status, body) = self
            .call(Method::POST, "/users/register", None, Some(creds.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let user_id = body["userId"].as_i64().unwrap();

        let (status, body) = self.call(Method::POST, "/users/login", None, Some(creds)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (user_id, body["token"].as_str().unwrap().to_string())
    }

    pub async fn send(&self, token: &str, sender: i64, receiver: i64, message: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            "/notifications/send",
            Some(token),
            Some(serde_json::json!({
                "senderId": sender,
                "receiverId": receiver,
                "message": message,
            })),
        )
        .await
    }
}
