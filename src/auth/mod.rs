pub mod password;
pub mod token;

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AdminSeed;
use crate::error::AppError;
use crate::models::user::{normalize_email, Role, User};
use crate::state::AppState;

/// Caller identity taken from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
}

impl AuthUser {
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "requires role {role}, caller is {}",
                self.role
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("no token".to_string()))?;
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();

        let claims = state.tokens.verify(token)?;

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
            name: claims.name,
        })
    }
}

/// Creates the configured administrator unless one already exists.
pub async fn seed_admin(state: &AppState, seed: &AdminSeed) -> Result<(), AppError> {
    let existing = state
        .users
        .iter()
        .find(|entry| entry.value().role == Role::Admin)
        .map(|entry| entry.value().email.clone());

    if let Some(email) = existing {
        info!(email = %email, "admin user already exists");
        return Ok(());
    }

    let admin = User {
        id: Uuid::new_v4(),
        name: seed.name.clone(),
        email: normalize_email(&seed.email),
        password_hash: password::hash(seed.password.clone()).await?,
        phone: seed.phone.clone(),
        role: Role::Admin,
        created_at: Utc::now(),
    };

    let email = admin.email.clone();
    state.insert_user(admin)?;
    warn!(email = %email, "seeded admin user; change the password after first login");
    Ok(())
}
