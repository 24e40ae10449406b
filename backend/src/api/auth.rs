use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, OrApiError};
use crate::api::server::AppState;
use crate::api::validation;
use crate::db::models::User;
use crate::db::repo::{self, StoreError};

const SIGN_UP_FAILED: &str = "Failed to sign up.";
const SIGN_IN_FAILED: &str = "Failed to sign in.";
const USERNAME_TAKEN: &str = "Username already taken";
const BAD_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignUpPayload {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs session tokens for authenticated users.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.key)
    }
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignUpPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.or_api_error(SIGN_UP_FAILED)?;
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty());
    validation::sign_up(&payload.username, &payload.password, email)?;

    let password = payload.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| ApiError::unknown(err, SIGN_UP_FAILED))?
        .map_err(|err| ApiError::unknown(err, SIGN_UP_FAILED))?;

    let created =
        repo::create_user(&state.db, payload.username.trim(), &password_hash, email).await;
    let user = match created {
        Err(StoreError::Conflict(_)) => return Err(ApiError::Conflict(USERNAME_TAKEN.to_string())),
        other => other.or_api_error(SIGN_UP_FAILED)?,
    };

    let token = state
        .tokens
        .issue(&user)
        .map_err(|err| ApiError::unknown(err, SIGN_UP_FAILED))?;

    tracing::info!(user_id = %user.id, username = %user.username, "user signed up");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignInPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.or_api_error(SIGN_IN_FAILED)?;
    validation::sign_in(&payload.username, &payload.password)?;

    let found = repo::find_user_by_username(&state.db, payload.username.trim())
        .await
        .or_api_error(SIGN_IN_FAILED)?;

    let verified = match found {
        Some((user, stored_hash)) => {
            let password = payload.password.clone();
            let matches =
                tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
                    .await
                    .map_err(|err| ApiError::unknown(err, SIGN_IN_FAILED))?;
            matches.then_some(user)
        }
        None => None,
    };

    let Some(user) = verified else {
        tracing::info!(username = %payload.username, "rejected sign in");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    };

    let token = state
        .tokens
        .issue(&user)
        .map_err(|err| ApiError::unknown(err, SIGN_IN_FAILED))?;

    Ok((StatusCode::OK, Json(AuthResponse { token, user })))
}
