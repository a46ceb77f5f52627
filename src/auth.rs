use std::time::{SystemTime, UNIX_EPOCH};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    error::ApiError,
    models::User,
    repository::{RepositoryState, UserRepository},
};

/// Claims
///
/// Payload of the bearer tokens issued at login and checked on every resource route.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the numeric id of the user in the `users` table.
    pub sub: i64,
    pub username: String,
    /// Expiration time, seconds since the epoch. Always validated.
    pub exp: usize,
    /// Issued-at time, seconds since the epoch.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// AuthUser Extractor
///
/// Accepts a request only when it carries `Authorization: Bearer <jwt>`, the token's
/// signature and expiry check out against the configured secret, and the subject still
/// exists in the `users` table. Any failure rejects with 401 before the handler runs.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = decode_token(token, &config.jwt_secret).map_err(|kind| {
            match kind {
                ErrorKind::ExpiredSignature => tracing::debug!("bearer token expired"),
                other => tracing::debug!(reason = ?other, "bearer token rejected"),
            }
            StatusCode::UNAUTHORIZED
        })?;

        // The account may have been removed after the token was issued.
        let user = repo
            .find_user(claims.sub)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, "user lookup failed during authentication");
                StatusCode::UNAUTHORIZED
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// Signs an HS256 token for `user`, valid for the configured TTL.
pub fn issue_token(user: &User, config: &AppConfig) -> Result<String, ApiError> {
    let now = now_secs();
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        iat: now as usize,
        exp: (now + config.jwt_ttl_secs) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|err| ApiError::Internal(format!("token signing failed: {err}")))
}

/// Validates signature and expiry, returning the claims or the reason for rejection.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ErrorKind> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| err.into_kind())
}

/// Hashes a password with Argon2id and a fresh random salt, producing a PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::Internal(format!("password hashing failed: {err}")))
}

/// Checks `password` against a stored PHC string. A malformed hash never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is not a valid PHC string");
            false
        }
    }
}
