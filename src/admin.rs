//! Admin registrations.
//!
//! Book and Comment carry list/filter/search declarations; the remaining
//! entities are registered with an empty [`ModelAdmin`] and get the generic
//! list/detail/delete screens.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{account, book, comment};
use crate::error::StoreResult;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ModelAdmin {
    pub model: &'static str,
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub search_fields: &'static [&'static str],
}

impl ModelAdmin {
    const fn generic(model: &'static str) -> ModelAdmin {
        ModelAdmin {
            model,
            list_display: &[],
            list_filter: &[],
            search_fields: &[],
        }
    }
}

pub const BOOK_ADMIN: ModelAdmin = ModelAdmin {
    model: "book",
    list_display: &["name", "isbn", "price", "publisher", "language"],
    list_filter: &["language", "price", "publisher"],
    search_fields: &["isbn", "name", "publisher"],
};

pub const COMMENT_ADMIN: ModelAdmin = ModelAdmin {
    model: "comment",
    list_display: &["book", "account", "content", "date"],
    list_filter: &["book", "date"],
    search_fields: &["book", "account", "content"],
};

pub const REGISTRY: [ModelAdmin; 6] = [
    BOOK_ADMIN,
    ModelAdmin::generic("account"),
    ModelAdmin::generic("order"),
    ModelAdmin::generic("order_book"),
    ModelAdmin::generic("shop_cart"),
    COMMENT_ADMIN,
];

#[derive(Debug, Default, Deserialize)]
pub struct BookListQuery {
    /// Substring matched against isbn, name and publisher.
    pub q: Option<String>,
    pub language: Option<String>,
    pub price: Option<f64>,
    pub publisher: Option<String>,
}

#[derive(Debug, Serialize, FromQueryResult, PartialEq)]
pub struct BookRow {
    pub id: i32,
    pub name: String,
    pub isbn: String,
    pub price: f64,
    pub publisher: String,
    pub language: String,
}

pub async fn list_books<C: ConnectionTrait>(
    db: &C,
    query: BookListQuery,
) -> StoreResult<Vec<BookRow>> {
    let mut condition = Condition::all();

    if let Some(language) = query.language {
        condition = condition.add(book::Column::Language.eq(language));
    }
    if let Some(price) = query.price {
        condition = condition.add(book::Column::Price.eq(price));
    }
    if let Some(publisher) = query.publisher {
        condition = condition.add(book::Column::Publisher.eq(publisher));
    }
    if let Some(q) = query.q.filter(|q| !q.trim().is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(book::Column::Isbn.contains(&q))
                .add(book::Column::Name.contains(&q))
                .add(book::Column::Publisher.contains(&q)),
        );
    }

    Ok(book::Entity::find()
        .filter(condition)
        .order_by_asc(book::Column::Id)
        .select_only()
        .column(book::Column::Id)
        .column(book::Column::Name)
        .column(book::Column::Isbn)
        .column(book::Column::Price)
        .column(book::Column::Publisher)
        .column(book::Column::Language)
        .into_model::<BookRow>()
        .all(db)
        .await?)
}

/// Date facet of the comment list.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFilter {
    Today,
    Past7Days,
    ThisMonth,
    ThisYear,
}

impl DateFilter {
    /// Earliest instant that passes the filter, relative to `now`.
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = now.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default();
        let today = Utc.from_utc_datetime(&midnight);
        match self {
            DateFilter::Today => today,
            DateFilter::Past7Days => today - Duration::days(7),
            DateFilter::ThisMonth => today - Duration::days(i64::from(now.day0())),
            DateFilter::ThisYear => today - Duration::days(i64::from(now.ordinal0())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    /// Substring matched against book name, account username and content.
    pub q: Option<String>,
    pub book: Option<i32>,
    pub date: Option<DateFilter>,
}

#[derive(Debug, Serialize, FromQueryResult, PartialEq)]
pub struct CommentRow {
    pub id: i32,
    pub book: String,
    pub account: String,
    pub content: String,
    pub date: DateTime<Utc>,
}

pub async fn list_comments<C: ConnectionTrait>(
    db: &C,
    query: CommentListQuery,
) -> StoreResult<Vec<CommentRow>> {
    let mut condition = Condition::all();

    if let Some(book_id) = query.book {
        condition = condition.add(comment::Column::BookId.eq(book_id));
    }
    if let Some(filter) = query.date {
        condition = condition.add(comment::Column::Date.gte(filter.since(Utc::now())));
    }
    if let Some(q) = query.q.filter(|q| !q.trim().is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(book::Column::Name.contains(&q))
                .add(account::Column::Username.contains(&q))
                .add(comment::Column::Content.contains(&q)),
        );
    }

    Ok(comment::Entity::find()
        .join(JoinType::InnerJoin, comment::Relation::Book.def())
        .join(JoinType::InnerJoin, comment::Relation::Account.def())
        .filter(condition)
        .order_by_desc(comment::Column::Date)
        .select_only()
        .column(comment::Column::Id)
        .column_as(Expr::col((book::Entity, book::Column::Name)), "book")
        .column_as(Expr::col((account::Entity, account::Column::Username)), "account")
        .column(comment::Column::Content)
        .column(comment::Column::Date)
        .into_model::<CommentRow>()
        .all(db)
        .await?)
}
