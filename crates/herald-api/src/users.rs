use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use herald_auth::{hash_password, verify_password};
use herald_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::blocking;
use crate::convert;
use crate::error::{ApiError, Result};
use crate::state::AppState;

fn require_credentials(
    username: Option<String>,
    password: Option<String>,
) -> Result<(String, String)> {
    match (username, password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
        _ => Err(ApiError::validation("Username and password are required")),
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid credentials")
}

/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    let (username, password) = require_credentials(req.username, req.password)?;

    let db = state.db.clone();
    let name = username.clone();
    let user_id = blocking(move || {
        let password_hash = hash_password(&password)?;
        db.create_user(&name, &password_hash)?
            .ok_or_else(|| ApiError::conflict("Username already exists"))
    })
    .await?;

    info!("Registered {} ({})", username, user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".into(),
            user_id,
        }),
    ))
}

/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    let (username, password) = require_credentials(req.username, req.password)?;

    let db = state.db.clone();
    let user = blocking(move || {
        let user = db
            .get_user_by_username(&username)?
            .ok_or_else(invalid_credentials)?;
        if !verify_password(&password, &user.password) {
            return Err(invalid_credentials());
        }
        Ok(user)
    })
    .await?;

    let token = state.keys.issue(user.id, &user.username)?;
    info!("{} ({}) logged in", user.username, user.id);

    Ok(Json(LoginResponse { token }))
}

/// GET /users/all
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let db = state.db.clone();
    let rows = blocking(move || Ok(db.list_users()?)).await?;

    Ok(Json(rows.into_iter().map(convert::user).collect::<Vec<_>>()))
}
