use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::middleware::{
    auth::Claims,
    logging::{message_response, ok_json, store_error_response, to_response, ApiError},
};
use crate::repository::carts;

//ROUTERS
pub fn cart_routes() -> Router {
    Router::new()
        .route("/cart", get(get_cart).post(add_book))
        .route("/cart/:id", patch(patch_entry).delete(remove_book))
}

//Routes
async fn get_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match carts::cart_lines(db.as_ref(), claims.account_id).await {
        Ok(lines) => ok_json(lines),
        Err(err) => store_error_response(err),
    }
}

async fn add_book(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddBook>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return transaction_failed(),
    };

    match carts::add_to_cart(&txn, claims.account_id, payload.book_id, payload.quantity).await {
        Ok((_, created)) => match txn.commit().await {
            Ok(_) if created => message_response(StatusCode::CREATED, "Added successfully"),
            Ok(_) => message_response(StatusCode::OK, "Resource patched successfully"),
            Err(err) => store_error_response(err.into()),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

async fn patch_entry(
    Path(id): Path<i32>,
    Extension(claims): Extension<Claims>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchCart>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return transaction_failed(),
    };

    match carts::set_quantity(&txn, claims.account_id, id, payload.quantity).await {
        Ok(entry) => match txn.commit().await {
            Ok(_) if entry.is_some() => {
                message_response(StatusCode::OK, "Resource patched successfully")
            }
            Ok(_) => message_response(StatusCode::OK, "Resource deleted successfully"),
            Err(err) => store_error_response(err.into()),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

async fn remove_book(
    Path(id): Path<i32>,
    Extension(claims): Extension<Claims>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return transaction_failed(),
    };

    match carts::remove_entry(&txn, claims.account_id, id).await {
        Ok(()) => match txn.commit().await {
            Ok(_) => message_response(StatusCode::OK, "Resource deleted successfully"),
            Err(err) => store_error_response(err.into()),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

pub(crate) fn transaction_failed() -> Response {
    to_response(
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        ),
        Err(ApiError::TransactionCreationFailed),
    )
}

#[derive(Deserialize, Debug)]
struct AddBook {
    book_id: i32,
    quantity: i32,
}

#[derive(Deserialize, Debug)]
struct PatchCart {
    quantity: i32,
}
