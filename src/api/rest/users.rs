use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::user::{Role, User};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", delete(delete_user))
}

#[derive(Deserialize)]
pub struct UsersQuery {
    pub role: Option<Role>,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    caller.require(Role::Admin)?;

    let users = state
        .users
        .iter()
        .filter(|entry| query.role.is_none_or(|role| entry.value().role == role))
        .map(|entry| entry.value().clone())
        .collect();
    Ok(Json(users))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    caller.require(Role::Admin)?;

    let user = state
        .remove_user(id)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;

    info!(user_id = %user.id, "user deleted by admin");
    Ok(Json(json!({ "deleted": user.id })))
}
