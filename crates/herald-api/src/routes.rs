use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use herald_gateway::connection;

use crate::notifications;
use crate::session::require_auth;
use crate::state::AppState;
use crate::users;

/// Build the full HTTP + gateway surface over `state`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/users/all", get(users::list_users))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/send", post(notifications::send_notification))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let ws_route = Router::new().route("/gateway", get(ws_upgrade));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let registry = state.registry.clone();
    let keys = state.keys.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, registry, keys))
}
