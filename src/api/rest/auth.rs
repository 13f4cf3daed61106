use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::password;
use crate::error::AppError;
use crate::models::user::{normalize_email, Role, User};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    #[serde(default)]
    pub phone: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let email = normalize_email(&payload.email);
    if payload.name.trim().is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "name, email and password required".to_string(),
        ));
    }

    if state.find_user_by_email(&email).is_some() {
        return Err(AppError::Duplicate(format!("email {email} already registered")));
    }

    // Nobody can self-register as an administrator.
    let role = match payload.role.unwrap_or(Role::Rider) {
        Role::Admin => Role::Rider,
        role => role,
    };

    let user = User {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        email,
        password_hash: password::hash(payload.password).await?,
        phone: payload.phone,
        role,
        created_at: Utc::now(),
    };

    state.insert_user(user.clone())?;
    info!(user_id = %user.id, role = %user.role, "user registered");

    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::BadRequest("invalid email or password".to_string());

    let user = state
        .find_user_by_email(&normalize_email(&payload.email))
        .ok_or_else(invalid)?;

    if !password::verify(payload.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let token = state.tokens.issue(&user)?;
    Ok(Json(LoginResponse { token, user }))
}
