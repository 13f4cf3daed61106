use crate::error::AppError;

const HASH_COST: u32 = 10;

pub async fn hash(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST))
        .await
        .map_err(|err| AppError::Internal(format!("hashing task failed: {err}")))?
        .map_err(|err| AppError::Internal(format!("failed to hash password: {err}")))
}

pub async fn verify(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| AppError::Internal(format!("verify task failed: {err}")))?
        .map_err(|err| AppError::Internal(format!("failed to verify password: {err}")))
}
