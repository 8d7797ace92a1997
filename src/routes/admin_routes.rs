use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use sea_orm::{
    DatabaseConnection, DatabaseTransaction, EntityName, EntityTrait, PrimaryKeyTrait,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{future::Future, pin::Pin, sync::Arc};
use validator::Validate;

use crate::admin::{self, BookListQuery, CommentListQuery, REGISTRY};
use crate::entities::{account, order, order_book, shop_cart};
use crate::error::{StoreError, StoreResult};
use crate::middleware::logging::{
    message_response, ok_json, store_error_response, to_response, ApiError,
};
use crate::repository::{
    accounts,
    books::{self, BookPatch, NewBook},
    comments, orders,
};

pub fn admin_routes() -> Router {
    Router::new()
        .route("/registry", get(get_registry))
        .route("/book", get(get_books).post(post_book))
        .route(
            "/book/:id",
            get(get_book).patch(patch_book).delete(delete_book),
        )
        .route(
            "/book/:id/related/:other",
            post(link_books).delete(unlink_books),
        )
        .route("/comment", get(get_comments))
        .route("/comment/:id", axum::routing::delete(delete_comment))
        .route("/account", get(list_entities::<account::Entity>))
        .route(
            "/account/:id",
            get(get_entity::<account::Entity>).delete(delete_entity::<account::Entity>),
        )
        .route("/account/:id/recommend", get(get_stored_recommendations))
        .route("/account/:id/recommend/:book", post(add_recommendation))
        .route("/order", get(get_orders))
        .route(
            "/order/:id",
            get(get_entity::<order::Entity>)
                .patch(patch_order)
                .delete(delete_entity::<order::Entity>),
        )
        .route("/order_book", get(list_entities::<order_book::Entity>))
        .route(
            "/order_book/:id",
            get(get_entity::<order_book::Entity>).delete(delete_entity::<order_book::Entity>),
        )
        .route("/shop_cart", get(list_entities::<shop_cart::Entity>))
        .route(
            "/shop_cart/:id",
            get(get_entity::<shop_cart::Entity>).delete(delete_entity::<shop_cart::Entity>),
        )
}

async fn get_registry() -> Response {
    ok_json(REGISTRY)
}

async fn get_books(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Query(query): Query<BookListQuery>,
) -> Response {
    match admin::list_books(db.as_ref(), query).await {
        Ok(rows) => ok_json(rows),
        Err(err) => store_error_response(err),
    }
}

async fn get_book(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match books::get_book(db.as_ref(), id).await {
        Ok(book) => ok_json(book),
        Err(err) => store_error_response(err),
    }
}

async fn post_book(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateBook>,
) -> Response {
    if let Err(err) = payload.validate() {
        return validation_failed(err);
    }

    in_transaction(db.as_ref(), |txn| {
        Box::pin(async move { books::create_book(txn, payload.into()).await })
    })
    .await
    .map_or_else(store_error_response, |book| {
        to_response((StatusCode::CREATED, Json(json!(book))), Ok(()))
    })
}

async fn patch_book(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchBook>,
) -> Response {
    if let Err(err) = payload.validate() {
        return validation_failed(err);
    }

    in_transaction(db.as_ref(), |txn| {
        Box::pin(async move { books::update_book(txn, id, payload.into()).await })
    })
    .await
    .map_or_else(store_error_response, ok_json)
}

async fn delete_book(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    in_transaction(db.as_ref(), |txn| {
        Box::pin(async move { books::delete_book(txn, id).await })
    })
    .await
    .map_or_else(store_error_response, |()| {
        message_response(StatusCode::OK, "Resource deleted successfully")
    })
}

async fn link_books(
    Path((id, other)): Path<(i32, i32)>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    in_transaction(db.as_ref(), |txn| {
        Box::pin(async move { books::link_related_books(txn, id, other).await })
    })
    .await
    .map_or_else(store_error_response, |()| {
        message_response(StatusCode::OK, "Books linked successfully")
    })
}

async fn unlink_books(
    Path((id, other)): Path<(i32, i32)>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    in_transaction(db.as_ref(), |txn| {
        Box::pin(async move { books::unlink_related_books(txn, id, other).await })
    })
    .await
    .map_or_else(store_error_response, |()| {
        message_response(StatusCode::OK, "Books unlinked successfully")
    })
}

async fn get_comments(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Query(query): Query<CommentListQuery>,
) -> Response {
    match admin::list_comments(db.as_ref(), query).await {
        Ok(rows) => ok_json(rows),
        Err(err) => store_error_response(err),
    }
}

async fn delete_comment(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    in_transaction(db.as_ref(), |txn| {
        Box::pin(async move { comments::delete_comment(txn, id).await })
    })
    .await
    .map_or_else(store_error_response, |()| {
        message_response(StatusCode::OK, "Resource deleted successfully")
    })
}

async fn get_orders(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    match orders::list_orders(db.as_ref()).await {
        Ok(orders) => ok_json(orders),
        Err(err) => store_error_response(err),
    }
}

async fn patch_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchOrder>,
) -> Response {
    let state = match payload.state.parse::<order::State>() {
        Ok(state) => state,
        Err(err) => {
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": err.clone()
                    })),
                ),
                Err(ApiError::ValidationFail(err)),
            )
        }
    };

    in_transaction(db.as_ref(), |txn| {
        Box::pin(async move { orders::set_state(txn, id, state).await })
    })
    .await
    .map_or_else(store_error_response, ok_json)
}

async fn get_stored_recommendations(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match accounts::stored_recommendations(db.as_ref(), id).await {
        Ok(books) => ok_json(books),
        Err(err) => store_error_response(err),
    }
}

async fn add_recommendation(
    Path((id, book_id)): Path<(i32, i32)>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    in_transaction(db.as_ref(), |txn| {
        Box::pin(async move { accounts::add_recommendation(txn, id, book_id).await })
    })
    .await
    .map_or_else(store_error_response, |()| {
        message_response(StatusCode::CREATED, "Added successfully")
    })
}

// Generic screens for the entities registered without list options.

async fn list_entities<E>(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response
where
    E: EntityTrait,
    E::Model: Serialize,
{
    match E::find().all(db.as_ref()).await {
        Ok(rows) => ok_json(rows),
        Err(err) => store_error_response(err.into()),
    }
}

async fn get_entity<E>(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response
where
    E: EntityTrait,
    E::Model: Serialize,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    match E::find_by_id(id).one(db.as_ref()).await {
        Ok(Some(row)) => ok_json(row),
        Ok(None) => entity_not_found::<E>(id),
        Err(err) => store_error_response(err.into()),
    }
}

async fn delete_entity<E>(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    match E::delete_by_id(id).exec(db.as_ref()).await {
        Ok(result) if result.rows_affected == 0 => entity_not_found::<E>(id),
        Ok(_) => message_response(StatusCode::OK, "Resource deleted successfully"),
        Err(err) => store_error_response(err.into()),
    }
}

fn entity_not_found<E: EntityTrait>(id: i32) -> Response {
    let message = format!("No {} with id {id} was found", E::default().table_name());
    to_response(
        (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": message
            })),
        ),
        Err(ApiError::General(message)),
    )
}

fn validation_failed(err: validator::ValidationErrors) -> Response {
    to_response(
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": err.to_string()
            })),
        ),
        Err(ApiError::ValidationFail(err.to_string())),
    )
}

/// Runs `op` inside a transaction, committing on success.
async fn in_transaction<T, F>(db: &DatabaseConnection, op: F) -> StoreResult<T>
where
    T: Send,
    F: for<'c> FnOnce(
            &'c DatabaseTransaction,
        ) -> Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'c>>
        + Send,
{
    db.transaction::<_, T, StoreError>(op)
        .await
        .map_err(|err| match err {
            TransactionError::Connection(db_err) => StoreError::Database(db_err),
            TransactionError::Transaction(err) => err,
        })
}

#[derive(Deserialize, Validate, Debug)]
struct CreateBook {
    #[validate(length(min = 1, max = 100))]
    isbn: String,
    #[validate(length(min = 1, max = 2000))]
    name: String,
    #[validate(length(max = 2000))]
    description: String,
    publish_date: NaiveDate,
    #[validate(range(min = 0.0))]
    price: f64,
    #[validate(length(max = 1000))]
    publisher: String,
    #[validate(range(min = 0))]
    page_number: i32,
    #[validate(length(max = 200))]
    language: String,
    #[validate(length(max = 100))]
    cover_image: String,
}

impl From<CreateBook> for NewBook {
    fn from(value: CreateBook) -> Self {
        NewBook {
            isbn: value.isbn,
            name: value.name,
            description: value.description,
            publish_date: value.publish_date,
            price: value.price,
            publisher: value.publisher,
            page_number: value.page_number,
            language: value.language,
            cover_image: value.cover_image,
        }
    }
}

#[derive(Deserialize, Validate, Debug, Default)]
#[serde(default)]
struct PatchBook {
    #[validate(length(min = 1, max = 100))]
    isbn: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    name: Option<String>,
    #[validate(length(max = 2000))]
    description: Option<String>,
    publish_date: Option<NaiveDate>,
    price: Option<f64>,
    #[validate(length(max = 1000))]
    publisher: Option<String>,
    #[validate(range(min = 0))]
    page_number: Option<i32>,
    #[validate(length(max = 200))]
    language: Option<String>,
    #[validate(length(max = 100))]
    cover_image: Option<String>,
}

impl From<PatchBook> for BookPatch {
    fn from(value: PatchBook) -> Self {
        BookPatch {
            isbn: value.isbn,
            name: value.name,
            description: value.description,
            publish_date: value.publish_date,
            price: value.price,
            publisher: value.publisher,
            page_number: value.page_number,
            language: value.language,
            cover_image: value.cover_image,
        }
    }
}

#[derive(Deserialize, Debug)]
struct PatchOrder {
    state: String,
}
