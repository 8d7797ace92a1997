use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use tracing::{debug, info};

use crate::entities::{
    book::{self, Entity as BookEntity},
    book_relation::{self, Entity as BookRelationEntity},
};
use crate::error::{StoreError, StoreResult};
use crate::repository::sample_exact;

/// Rows returned by the hotest/latest helpers.
pub const SHOWCASE_LIMIT: u64 = 4;
/// Books returned by [`sample_related_books`].
pub const RELATED_SAMPLE: usize = 2;

#[derive(Clone, Debug)]
pub struct NewBook {
    pub isbn: String,
    pub name: String,
    pub description: String,
    pub publish_date: NaiveDate,
    pub price: f64,
    pub publisher: String,
    pub page_number: i32,
    pub language: String,
    pub cover_image: String,
}

#[derive(Clone, Debug, Default)]
pub struct BookPatch {
    pub isbn: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub publisher: Option<String>,
    pub page_number: Option<i32>,
    pub language: Option<String>,
    pub cover_image: Option<String>,
}

pub async fn get_book<C: ConnectionTrait>(db: &C, id: i32) -> StoreResult<book::Model> {
    BookEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(StoreError::NotFound { entity: "book", id })
}

pub async fn list_books<C: ConnectionTrait>(db: &C) -> StoreResult<Vec<book::Model>> {
    Ok(BookEntity::find()
        .order_by_asc(book::Column::Id)
        .all(db)
        .await?)
}

/// First four books in storage order. There is no popularity ranking behind it.
pub async fn hotest_books<C: ConnectionTrait>(db: &C) -> StoreResult<Vec<book::Model>> {
    first_books(db).await
}

/// First four books in storage order, not sorted by publish date.
pub async fn latest_books<C: ConnectionTrait>(db: &C) -> StoreResult<Vec<book::Model>> {
    first_books(db).await
}

async fn first_books<C: ConnectionTrait>(db: &C) -> StoreResult<Vec<book::Model>> {
    Ok(BookEntity::find()
        .order_by_asc(book::Column::Id)
        .limit(SHOWCASE_LIMIT)
        .all(db)
        .await?)
}

/// The whole related set of a book.
pub async fn related_books<C: ConnectionTrait>(db: &C, book_id: i32) -> StoreResult<Vec<book::Model>> {
    related_books_of_many(db, vec![book_id]).await
}

/// Related books of every book in `book_ids`, one row per link.
pub(crate) async fn related_books_of_many<C: ConnectionTrait>(
    db: &C,
    book_ids: Vec<i32>,
) -> StoreResult<Vec<book::Model>> {
    Ok(BookEntity::find()
        .join(JoinType::InnerJoin, book_relation::Relation::ToBook.def().rev())
        .filter(book_relation::Column::FromBookId.is_in(book_ids))
        .order_by_asc(book_relation::Column::FromBookId)
        .order_by_asc(book::Column::Id)
        .all(db)
        .await?)
}

/// Two books picked at random from the related set.
///
/// Fails with `InsufficientCandidates` when fewer than two are related.
pub async fn sample_related_books<C: ConnectionTrait>(
    db: &C,
    book_id: i32,
) -> StoreResult<Vec<book::Model>> {
    get_book(db, book_id).await?;
    let related = related_books(db, book_id).await?;
    debug!(book_id, available = related.len(), "Sampling related books");
    sample_exact(&related, RELATED_SAMPLE)
}

/// Links two books in both directions. Linking an existing pair is a no-op.
pub async fn link_related_books<C: ConnectionTrait>(db: &C, a: i32, b: i32) -> StoreResult<()> {
    if a == b {
        return Err(StoreError::InvalidInput(
            "A book cannot be related to itself".to_owned(),
        ));
    }
    get_book(db, a).await?;
    get_book(db, b).await?;

    for (from, to) in [(a, b), (b, a)] {
        if BookRelationEntity::find_by_id((from, to)).one(db).await?.is_none() {
            let link = book_relation::ActiveModel {
                from_book_id: Set(from),
                to_book_id: Set(to),
            };
            BookRelationEntity::insert(link).exec(db).await?;
        }
    }

    info!(a, b, "Linked related books");
    Ok(())
}

pub async fn unlink_related_books<C: ConnectionTrait>(db: &C, a: i32, b: i32) -> StoreResult<()> {
    for (from, to) in [(a, b), (b, a)] {
        BookRelationEntity::delete_by_id((from, to)).exec(db).await?;
    }
    info!(a, b, "Unlinked related books");
    Ok(())
}

pub async fn create_book<C: ConnectionTrait>(db: &C, new: NewBook) -> StoreResult<book::Model> {
    if new.price < 0.0 || !new.price.is_finite() {
        return Err(StoreError::InvalidInput(format!(
            "Invalid book price: {}",
            new.price
        )));
    }

    let book = book::ActiveModel {
        isbn: Set(new.isbn),
        name: Set(new.name),
        description: Set(new.description),
        publish_date: Set(new.publish_date),
        price: Set(new.price),
        publisher: Set(new.publisher),
        page_number: Set(new.page_number),
        language: Set(new.language),
        cover_image: Set(new.cover_image),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = book.id, name = %book, "Created book");
    Ok(book)
}

pub async fn update_book<C: ConnectionTrait>(
    db: &C,
    id: i32,
    patch: BookPatch,
) -> StoreResult<book::Model> {
    let mut book: book::ActiveModel = get_book(db, id).await?.into();

    if let Some(isbn) = patch.isbn {
        book.isbn = Set(isbn);
    }
    if let Some(name) = patch.name {
        book.name = Set(name);
    }
    if let Some(description) = patch.description {
        book.description = Set(description);
    }
    if let Some(publish_date) = patch.publish_date {
        book.publish_date = Set(publish_date);
    }
    if let Some(price) = patch.price {
        if price < 0.0 || !price.is_finite() {
            return Err(StoreError::InvalidInput(format!("Invalid book price: {price}")));
        }
        book.price = Set(price);
    }
    if let Some(publisher) = patch.publisher {
        book.publisher = Set(publisher);
    }
    if let Some(page_number) = patch.page_number {
        book.page_number = Set(page_number);
    }
    if let Some(language) = patch.language {
        book.language = Set(language);
    }
    if let Some(cover_image) = patch.cover_image {
        book.cover_image = Set(cover_image);
    }

    Ok(book.update(db).await?)
}

pub async fn delete_book<C: ConnectionTrait>(db: &C, id: i32) -> StoreResult<()> {
    let book = get_book(db, id).await?;
    book.delete(db).await?;
    info!(id, "Deleted book");
    Ok(())
}
