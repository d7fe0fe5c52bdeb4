mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;
use herald_api::session::authenticate_request;

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = TestApp::new();
    let creds = json!({ "username": "alice", "password": "pw-alice" });

    let (status, body) = app
        .call(Method::POST, "/users/register", None, Some(creds.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert!(body["userId"].as_i64().is_some());

    let (status, body) = app.call(Method::POST, "/users/register", None, Some(creds)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already exists");

    let (status, _) = app
        .call(
            Method::POST,
            "/users/register",
            None,
            Some(json!({ "username": "bob", "password": "pw-bob" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn register_and_login_require_both_fields() {
    let app = TestApp::new();
    for path in ["/users/register", "/users/login"] {
        for body in [
            json!({ "username": "alice" }),
            json!({ "password": "pw" }),
            json!({ "username": "", "password": "pw" }),
        ] {
            let (status, _) = app.call(Method::POST, path, None, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        }
    }

    let (status, body) = app.call(Method::POST, "/users/register", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_token_resolves_to_user() {
    let app = TestApp::new();
    let (user_id, token) = app.signup("alice", "correct horse").await;

    let header = format!("Bearer {token}");
    let claims = authenticate_request(Some(header.as_str()), &app.state.keys).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.username, "alice");

    let (status, body) = app
        .call(
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
    assert!(body.get("token").is_none());

    let (status, _) = app
        .call(
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "nobody", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = TestApp::new();
    let routes = [
        (Method::GET, "/users/all"),
        (Method::POST, "/notifications/send"),
        (Method::GET, "/notifications"),
        (Method::PUT, "/notifications/1/read"),
        (Method::PUT, "/notifications/read-all"),
        (Method::GET, "/notifications/unread-count"),
    ];

    for (method, uri) in routes {
        let (status, _) = app.call(method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");

        let (status, body) = app.call(method.clone(), uri, Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["error"], "Invalid or expired token");
    }
}

#[tokio::test]
async fn list_users_hides_password_hashes() {
    let app = TestApp::new();
    let (_, token) = app.signup("alice", "pw-alice").await;
    app.signup("bob", "pw-bob").await;

    let (status, body) = app.call(Method::GET, "/users/all", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user["id"].is_i64());
        assert!(user["username"].is_string());
        assert!(user["created_at"].is_string());
        assert!(user.get("password").is_none());
    }
}

#[tokio::test]
async fn send_validates_input() {
    let app = TestApp::new();
    let (alice, token) = app.signup("alice", "pw-alice").await;
    let (bob, _) = app.signup("bob", "pw-bob").await;

    let (status, _) = app.send(&token, alice, bob, &"x".repeat(255)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send(&token, alice, bob, &"x".repeat(256)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("255"));

    let (status, _) = app
        .call(
            Method::POST,
            "/notifications/send",
            Some(&token),
            Some(json!({ "senderId": alice, "message": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(&token, alice, 9999, "hi").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Receiver not found");

    let (status, _) = app.send(&token, bob, alice, "spoofed").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn offline_delivery_read_flow() {
    let app = TestApp::new();
    let (alice, alice_token) = app.signup("alice", "pw-alice").await;
    let (bob, bob_token) = app.signup("bob", "pw-bob").await;

    let (status, body) = app.send(&alice_token, alice, bob, "hi").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Notification sent successfully");
    let notification = &body["notification"];
    assert_eq!(notification["sender_id"], alice);
    assert_eq!(notification["receiver_id"], bob);
    assert_eq!(notification["message"], "hi");
    assert_eq!(notification["is_read"], false);
    assert!(notification["created_at"].is_string());
    let id = notification["id"].as_i64().unwrap();

    let (status, body) = app.call(Method::GET, "/notifications", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["notifications"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id);
    assert_eq!(items[0]["is_read"], false);
    assert_eq!(items[0]["sender_username"], "alice");
    assert_eq!(body["pagination"], json!({ "page": 1, "limit": 10, "hasMore": false }));

    let uri = format!("/notifications/{id}/read");
    let (status, body) = app.call(Method::PUT, &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Notification marked as read");

    let (_, body) = app.call(Method::GET, "/notifications", Some(&bob_token), None).await;
    assert_eq!(body["notifications"][0]["is_read"], true);

    let (status, _) = app.call(Method::PUT, &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(Method::PUT, &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(Method::PUT, "/notifications/99999/read", Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(Method::PUT, "/notifications/abc/read", Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pagination_over_http() {
    let app = TestApp::new();
    let (alice, alice_token) = app.signup("alice", "pw-alice").await;
    let (bob, bob_token) = app.signup("bob", "pw-bob").await;

    for i in 0..7 {
        let (status, _) = app.send(&alice_token, alice, bob, &format!("n{i}")).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app
        .call(Method::GET, "/notifications?page=1&limit=3", Some(&bob_token), None)
        .await;
    let messages: Vec<_> = body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(messages, ["n6", "n5", "n4"]);
    assert_eq!(body["pagination"]["hasMore"], true);

    let (_, body) = app
        .call(Method::GET, "/notifications?page=3&limit=3", Some(&bob_token), None)
        .await;
    assert_eq!(body["notifications"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"], json!({ "page": 3, "limit": 3, "hasMore": false }));

    let (_, body) = app
        .call(Method::GET, "/notifications?page=x&limit=-4", Some(&bob_token), None)
        .await;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
}

#[tokio::test]
async fn read_all_clears_unread_count() {
    let app = TestApp::new();
    let (alice, alice_token) = app.signup("alice", "pw-alice").await;
    let (bob, bob_token) = app.signup("bob", "pw-bob").await;

    for _ in 0..3 {
        app.send(&alice_token, alice, bob, "ping").await;
    }

    let (status, body) = app
        .call(Method::GET, "/notifications/unread-count", Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unreadCount"], 3);

    let (status, body) = app
        .call(Method::PUT, "/notifications/read-all", Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All notifications marked as read");

    let (_, body) = app
        .call(Method::GET, "/notifications/unread-count", Some(&bob_token), None)
        .await;
    assert_eq!(body["unreadCount"], 0);
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
