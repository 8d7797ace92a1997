use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::middleware::{
    auth::Claims,
    logging::{store_error_response, to_response},
};
use crate::repository::comments;
use crate::routes::cart_routes::transaction_failed;

pub fn comment_routes() -> Router {
    Router::new().route("/comment", post(post_comment))
}

async fn post_comment(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateComment>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return transaction_failed(),
    };

    let comment = match comments::create_comment(
        &txn,
        claims.account_id,
        payload.book_id,
        payload.content,
    )
    .await
    {
        Ok(comment) => comment,
        Err(err) => {
            let _ = txn.rollback().await;
            return store_error_response(err);
        }
    };

    let username = match comments::user_info(&txn, &comment).await {
        Ok(username) => username,
        Err(err) => {
            let _ = txn.rollback().await;
            return store_error_response(err);
        }
    };

    match txn.commit().await {
        Ok(_) => to_response(
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": comment.id,
                    "book_id": comment.book_id,
                    "username": username,
                    "content": comment.content,
                    "date": comment.date,
                    "title": comment.to_string(),
                })),
            ),
            Ok(()),
        ),
        Err(err) => store_error_response(err.into()),
    }
}

#[derive(Deserialize, Debug)]
struct CreateComment {
    book_id: i32,
    content: String,
}
