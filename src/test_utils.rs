//! Shared helpers for the unit tests: an in-memory database with every table
//! created, plus quick constructors for rows most tests need.

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::entities::{account, book, setup_schema};
use crate::error::StoreResult;

// Never verified by tests that use it; hashing with argon2 is too slow to do per test.
const PLACEHOLDER_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$placeholder";

pub async fn setup_test_db() -> StoreResult<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    setup_schema(&db).await?;
    Ok(db)
}

/// A book with a fixed isbn, publisher and language; only name and price vary.
pub async fn create_test_book(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
) -> StoreResult<book::Model> {
    let book = book::ActiveModel {
        isbn: Set("9780000000000".to_owned()),
        name: Set(name.to_owned()),
        description: Set(format!("About {name}")),
        publish_date: Set(NaiveDate::from_ymd_opt(2001, 2, 3).unwrap_or_default()),
        price: Set(price),
        publisher: Set("Test Press".to_owned()),
        page_number: Set(100),
        language: Set("English".to_owned()),
        cover_image: Set("cover.png".to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(book)
}

pub async fn create_test_account(
    db: &DatabaseConnection,
    username: &str,
) -> StoreResult<account::Model> {
    let account = account::ActiveModel {
        username: Set(username.to_owned()),
        password: Set(PLACEHOLDER_HASH.to_owned()),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        email: Set(String::new()),
        address: Set("Nowhere".to_owned()),
        role: Set(account::Role::User),
        is_active: Set(true),
        date_joined: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(account)
}
