use std::env;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub event_buffer_size: usize,
    pub uploads_dir: String,
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| AppError::Internal("JWT_SECRET must be set".to_string()))?;

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") | Err(_) => LogFormat::Compact,
            Ok(other) => {
                return Err(AppError::Internal(format!(
                    "invalid LOG_FORMAT: {other}, expected compact/json"
                )));
            }
        };

        let token_ttl_hours = parse_or_default("TOKEN_TTL_HOURS", 24)?;
        if token_ttl_hours <= 0 {
            return Err(AppError::Internal(
                "TOKEN_TTL_HOURS must be > 0".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 5000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,
            jwt_secret,
            token_ttl_hours,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            admin_seed: admin_seed_from_env(),
        })
    }
}

// Seeding only happens when both credentials are configured.
fn admin_seed_from_env() -> Option<AdminSeed> {
    let email = env::var("ADMIN_EMAIL").ok()?;
    let password = env::var("ADMIN_PASSWORD").ok()?;

    Some(AdminSeed {
        name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin User".to_string()),
        email,
        password,
        phone: env::var("ADMIN_PHONE").unwrap_or_default(),
    })
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
