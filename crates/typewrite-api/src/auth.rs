use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{Json, extract::State, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::json;

use typewrite_db::Database;
use typewrite_db::models::UserRow;
use typewrite_types::api::{Claims, LoginRequest};

use crate::config::Config;
use crate::error::ApiError;
use crate::users::user_to_response;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: Config,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(&req.email)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::Unauthorized)?;

    verify_password(&req.password, &user.password)?;

    let token = create_token(&state.config, &state.db, &user)?;

    Ok(Json(json!({
        "status": "success",
        "token": token,
        "user": user_to_response(&user),
    })))
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored password hash is corrupt: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::Unauthorized)
}

/// Signs the public subset of a user record. The same token shape backs
/// logins and email verification links.
pub fn create_token(config: &Config, db: &Database, user: &UserRow) -> Result<String, ApiError> {
    let role = match user.role_id {
        Some(role_id) => db
            .get_role(role_id)
            .map_err(ApiError::Database)?
            .map(|r| r.role_type)
            .unwrap_or_default(),
        None => String::new(),
    };

    let claims = Claims {
        sub: user.id.clone(),
        user_name: user.user_name.clone(),
        email: user.email.clone(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(config.token_expiry_days)).timestamp()
            as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token signing failed: {e}")))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter42").unwrap();
        assert!(hash.starts_with("$argon2"));
        verify_password("hunter42", &hash).unwrap();
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(ApiError::Unauthorized)
        ));
    }
}
