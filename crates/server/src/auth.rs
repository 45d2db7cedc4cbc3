//! Passwords, session tokens and the authenticated-caller extractor.
//!
//! A session token is 32 random bytes, hex-encoded, handed to the client
//! once. Only its SHA-256 is stored.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use database::models::Role;
use sha2::{Digest, Sha256};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Cookie carrying the session token for the HTML dashboard.
pub const SESSION_COOKIE: &str = "agrilog_session";

/// Hash a password with Argon2id into a PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// A fresh random session token.
pub fn new_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// What is stored for a token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.to_string())
    })
}

/// The signed-in caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
    /// Hash of the presented token, for logout.
    pub token_hash: String,
}

impl AuthUser {
    /// Fail with 403 unless the caller holds `role`.
    pub fn require(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "{} access required",
                role.as_str()
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = token_from_parts(parts).ok_or(ApiError::Unauthorized)?;
        let token_hash = hash_token(&token);

        let user_id = database::session::find_session_user(state.db.pool(), &token_hash)
            .await?
            .ok_or(ApiError::Unauthorized)?;
        let role = match database::user_role::get_role(state.db.pool(), &user_id).await {
            Ok(role) => role,
            Err(database::DatabaseError::NotFound { .. }) => return Err(ApiError::Unauthorized),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            user_id,
            role,
            token_hash,
        })
    }
}
