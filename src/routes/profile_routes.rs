use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::entities::account::{self, Role};
use crate::middleware::{
    auth::Claims,
    logging::{message_response, ok_json, store_error_response, to_response, ApiError},
};
use crate::repository::accounts;
use crate::routes::{book_routes::BookSummaryResponse, cart_routes::transaction_failed};

pub fn profile_routes() -> Router {
    Router::new()
        .route("/profile", get(get_profile).patch(patch_profile))
        .route("/profile/recommend", get(get_recommendations))
}

async fn get_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match accounts::get_account(db.as_ref(), claims.account_id).await {
        Ok(model) => ok_json(ProfileResponse::new(model)),
        Err(err) => store_error_response(err),
    }
}

async fn patch_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatchProfile>,
) -> Response {
    if let Err(err) = payload.validate() {
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Address is too long"
                })),
            ),
            Err(ApiError::ValidationFail(err.to_string())),
        );
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return transaction_failed(),
    };

    match accounts::update_address(&txn, claims.account_id, payload.address).await {
        Ok(_) => match txn.commit().await {
            Ok(_) => message_response(StatusCode::OK, "Resource patched successfully"),
            Err(err) => store_error_response(err.into()),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

async fn get_recommendations(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match accounts::recommend_books(db.as_ref(), claims.account_id).await {
        Ok(books) => ok_json(
            books
                .into_iter()
                .map(BookSummaryResponse::new)
                .collect::<Vec<_>>(),
        ),
        Err(err) => store_error_response(err),
    }
}

#[derive(Deserialize, Validate, Debug)]
struct PatchProfile {
    #[validate(length(max = 1000))]
    address: String,
}

#[derive(Serialize)]
struct ProfileResponse {
    id: i32,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    address: String,
    role: Role,
    display: String,
}

impl ProfileResponse {
    fn new(model: account::Model) -> ProfileResponse {
        ProfileResponse {
            display: model.to_string(),
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            address: model.address,
            role: model.role,
        }
    }
}
