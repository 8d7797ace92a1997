use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::get,
    Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

use crate::entities::book;
use crate::middleware::logging::{ok_json, store_error_response};
use crate::repository::{books, comments};

pub fn book_routes() -> Router {
    Router::new()
        .route("/book", get(get_books))
        .route("/book/hotest", get(get_hotest_books))
        .route("/book/latest", get(get_latest_books))
        .route("/book/:id", get(get_book))
        .route("/book/:id/related", get(get_related_books))
        .route("/book/:id/comment", get(get_comments))
}

async fn get_books(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    summaries(books::list_books(db.as_ref()).await)
}

async fn get_hotest_books(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    summaries(books::hotest_books(db.as_ref()).await)
}

async fn get_latest_books(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    summaries(books::latest_books(db.as_ref()).await)
}

async fn get_related_books(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    summaries(books::sample_related_books(db.as_ref(), id).await)
}

async fn get_book(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match books::get_book(db.as_ref(), id).await {
        Ok(book) => ok_json(BookDetailResponse::new(book)),
        Err(err) => store_error_response(err),
    }
}

async fn get_comments(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match comments::comments_for_book(db.as_ref(), id).await {
        Ok(comments) => ok_json(comments),
        Err(err) => store_error_response(err),
    }
}

fn summaries(result: crate::error::StoreResult<Vec<book::Model>>) -> Response {
    match result {
        Ok(books) => ok_json(
            books
                .into_iter()
                .map(BookSummaryResponse::new)
                .collect::<Vec<_>>(),
        ),
        Err(err) => store_error_response(err),
    }
}

#[derive(Serialize)]
pub(crate) struct BookSummaryResponse {
    id: i32,
    name: String,
    price: f64,
    publisher: String,
    language: String,
    cover_image: String,
    header_description: String,
}

impl BookSummaryResponse {
    pub(crate) fn new(value: book::Model) -> BookSummaryResponse {
        BookSummaryResponse {
            header_description: value.header_description(),
            id: value.id,
            name: value.name,
            price: value.price,
            publisher: value.publisher,
            language: value.language,
            cover_image: value.cover_image,
        }
    }
}

#[derive(Serialize)]
struct BookDetailResponse {
    #[serde(flatten)]
    book: book::Model,
    header_description: String,
}

impl BookDetailResponse {
    fn new(book: book::Model) -> BookDetailResponse {
        BookDetailResponse {
            header_description: book.header_description(),
            book,
        }
    }
}
