use crate::entities::account::{Entity as AccountEntity, Role};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use thiserror::Error;
use tracing::{debug, warn};

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = match validate_token(&state, token).await {
        Ok(claims) => claims,
        Err(err) => {
            warn!(uri = %req.uri(), error = %err, "Rejected request");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    debug!(account_id = claims.account_id, role = %claims.role, "Authenticated");
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub account_id: i32,
    pub role: String,
    pub exp: usize,
}

/// Signing key handed to the login handler.
#[derive(Clone, Debug)]
pub struct JwtSecret(pub Arc<str>);

#[derive(Clone, Debug)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
    pub role: Role,
    pub secret: Arc<str>,
}

pub fn generate_token(account_id: i32, role: Role, secret: &str) -> Result<String, AuthError> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or(AuthError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims {
        account_id,
        role: role.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::GenerationFail)
}

pub async fn validate_token(state: &AuthState, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::TokenExpired)?
    .claims;

    let role = Role::from_str(&claims.role).map_err(|_| AuthError::ValidationFail)?;

    // The stored role wins over the one baked into the token.
    match AccountEntity::find_by_id(claims.account_id)
        .one(state.db.as_ref())
        .await
    {
        Ok(Some(account)) if account.is_active && account.role == role => {
            if role.permits(state.role) {
                Ok(claims)
            } else {
                Err(AuthError::InvalidUserOrRole)
            }
        }
        Ok(_) => Err(AuthError::InvalidUserOrRole),
        Err(_) => Err(AuthError::InternalServerError),
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid user id or role")]
    InvalidUserOrRole,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to validate token")]
    ValidationFail,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Internal server error")]
    InternalServerError,
}
