use axum::{extract::Extension, http::StatusCode, response::Response, routing::post, Json, Router};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::account::Role;
use crate::middleware::{
    auth::{generate_token, JwtSecret},
    logging::{message_response, store_error_response, to_response, ApiError},
};
use crate::repository::accounts::{self, NewAccount};

pub fn auth_routes() -> Router {
    Router::new()
        .route("/register", post(register_account))
        .route("/login", post(login))
}

// ROUTES
async fn register_account(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateAccount>,
) -> Response {
    if let Err(err) = payload.validate() {
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": err.to_string()
                })),
            ),
            Err(ApiError::ValidationFail(err.to_string())),
        );
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    let new_account = NewAccount {
        username: payload.username,
        password: payload.password,
        email: payload.email.unwrap_or_default(),
        first_name: payload.first_name.unwrap_or_default(),
        last_name: payload.last_name.unwrap_or_default(),
        address: payload.address.unwrap_or_default(),
    };

    match accounts::create_account(&txn, new_account, Role::User).await {
        Ok(_) => match txn.commit().await {
            Ok(_) => message_response(StatusCode::CREATED, "Account registered successfully"),
            Err(err) => store_error_response(err.into()),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(JwtSecret(secret)): Extension<JwtSecret>,
    Json(payload): Json<AccountLogin>,
) -> Response {
    let invalid = || {
        to_response(
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Invalid username or password"
                })),
            ),
            Err(ApiError::General("Invalid username or password".to_owned())),
        )
    };

    let account = match accounts::find_by_username(db.as_ref(), &payload.username).await {
        Ok(Some(account)) if account.is_active => account,
        Ok(_) => return invalid(),
        Err(err) => return store_error_response(err),
    };

    if account.check_hash(&payload.password).is_err() {
        return invalid();
    }

    match generate_token(account.id, account.role, &secret) {
        Ok(token) => to_response(
            (
                StatusCode::OK,
                Json(json!({
                    "token": token
                })),
            ),
            Ok(()),
        ),
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error"
                })),
            ),
            Err(ApiError::TokenGenerationFailed(err.to_string())),
        ),
    }
}

//structs
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.@+-]{3,150}$").expect("username pattern is valid")
});

#[derive(Deserialize, Clone, Debug, Validate)]
struct CreateAccount {
    #[validate(regex(path = *USERNAME_REGEX))]
    username: String,
    #[validate(length(min = 8, max = 128))]
    password: String,
    #[validate(email)]
    email: Option<String>,
    #[validate(length(max = 150))]
    first_name: Option<String>,
    #[validate(length(max = 150))]
    last_name: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
struct AccountLogin {
    username: String,
    password: String,
}
