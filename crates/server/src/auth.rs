use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::app_state::AppState;
use crate::errors::ServerError;

pub const DEVICE_KEY_HEADER: &str = "x-device-key";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// The caller behind a valid bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Who is allowed through on routes open to devices and users alike.
#[derive(Debug, Clone, PartialEq)]
pub enum Caller {
    Device,
    User(AuthUser),
}

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn issue(&self, id: i64, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            id,
            email: email.to_string(),
            iat,
            exp: iat.saturating_add(self.ttl_seconds as i64),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

pub fn auth_user(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ServerError> {
    let token = bearer_token(headers)?;
    let claims = state
        .tokens
        .verify(&token)
        .map_err(|_| ServerError::new(StatusCode::UNAUTHORIZED, "invalid token"))?;
    Ok(AuthUser {
        id: claims.id,
        email: claims.email,
    })
}

pub fn require_device(state: &AppState, headers: &HeaderMap) -> Result<(), ServerError> {
    if device_key_matches(state, headers) {
        return Ok(());
    }
    Err(ServerError::new(StatusCode::UNAUTHORIZED, "unauthorized device"))
}

/// Accepts either device credential or, failing that, a user token.
pub fn device_or_user(state: &AppState, headers: &HeaderMap) -> Result<Caller, ServerError> {
    if device_key_matches(state, headers) {
        return Ok(Caller::Device);
    }
    if headers.contains_key(DEVICE_KEY_HEADER) {
        return Err(ServerError::new(StatusCode::UNAUTHORIZED, "unauthorized device"));
    }
    auth_user(state, headers).map(Caller::User)
}

/// Devices send the key in `X-Device-Key` or, for older firmware, as the bearer token.
fn device_key_matches(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(expected) = state.device_key_hash.as_deref() else {
        return false;
    };
    let from_header = headers
        .get(DEVICE_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    from_header
        .or_else(|| bearer_token(headers).ok())
        .is_some_and(|provided| hash_token(&provided) == expected)
}

pub fn bearer_token(headers: &HeaderMap) -> Result<String, ServerError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let token = value.strip_prefix("Bearer ").unwrap_or("").trim();
    if token.is_empty() {
        return Err(ServerError::new(
            StatusCode::UNAUTHORIZED,
            "missing bearer token",
        ));
    }
    Ok(token.to_string())
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("password hash error: {e}"))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(hash: &str, password: &str) -> Result<(), String> {
    let parsed = PasswordHash::new(hash).map_err(|e| format!("password hash parse error: {e}"))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|e| format!("password verify error: {e}"))
}

/// Hex SHA-256; used to compare shared secrets without keeping them in memory.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
