use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::entities::{
    account::{self, Entity as AccountEntity, Role},
    book::{self, Entity as BookEntity},
    order::{self, Entity as OrderEntity},
    order_book::{self, Entity as OrderBookEntity},
    recommend_book::{self, Entity as RecommendBookEntity},
};
use crate::error::{StoreError, StoreResult};
use crate::repository::{books, sample};

/// Upper bound on [`recommend_books`] results.
pub const RECOMMEND_SAMPLE: usize = 4;

#[derive(Clone, Debug)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
}

pub fn hash_password(password: &str) -> StoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| StoreError::PasswordHash(err.to_string()))
}

pub async fn create_account<C: ConnectionTrait>(
    db: &C,
    new: NewAccount,
    role: Role,
) -> StoreResult<account::Model> {
    if find_by_username(db, &new.username).await?.is_some() {
        return Err(StoreError::Conflict(format!(
            "Username {} already exists",
            new.username
        )));
    }

    let password = hash_password(&new.password)?;
    let username = new.username.clone();
    let account = account::ActiveModel {
        username: Set(new.username),
        password: Set(password),
        first_name: Set(new.first_name),
        last_name: Set(new.last_name),
        email: Set(new.email),
        address: Set(new.address),
        role: Set(role),
        is_active: Set(true),
        date_joined: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| username_taken(err, &username))?;

    info!(id = account.id, account = %account, role = %account.role, "Created account");
    Ok(account)
}

/// A concurrent registration can slip past the lookup above; the unique
/// index still catches it.
fn username_taken(err: DbErr, username: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::Conflict(format!("Username {username} already exists"))
        }
        _ => StoreError::Database(err),
    }
}

pub async fn get_account<C: ConnectionTrait>(db: &C, id: i32) -> StoreResult<account::Model> {
    AccountEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "account",
            id,
        })
}

pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> StoreResult<Option<account::Model>> {
    Ok(AccountEntity::find()
        .filter(account::Column::Username.eq(username))
        .one(db)
        .await?)
}

pub async fn update_address<C: ConnectionTrait>(
    db: &C,
    id: i32,
    address: String,
) -> StoreResult<account::Model> {
    let mut account: account::ActiveModel = get_account(db, id).await?.into();
    account.address = Set(address);
    Ok(account.update(db).await?)
}

/// Up to four books related to anything the account has ever ordered.
///
/// The pool is every related book of every book in every order of the
/// account, de-duplicated; an empty pool gives an empty result.
pub async fn recommend_books<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
) -> StoreResult<Vec<book::Model>> {
    get_account(db, account_id).await?;

    let order_ids: Vec<i32> = OrderEntity::find()
        .filter(order::Column::AccountId.eq(account_id))
        .all(db)
        .await?
        .into_iter()
        .map(|order| order.id)
        .collect();

    let ordered_book_ids: Vec<i32> = OrderBookEntity::find()
        .filter(order_book::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_book::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|line| line.book_id)
        .collect();

    let mut seen = HashSet::new();
    let pool: Vec<book::Model> = books::related_books_of_many(db, ordered_book_ids)
        .await?
        .into_iter()
        .filter(|book| seen.insert(book.id))
        .collect();

    debug!(account_id, pool = pool.len(), "Sampling recommendations");
    Ok(sample(&pool, RECOMMEND_SAMPLE))
}

/// Books explicitly stored as recommendations for the account.
pub async fn stored_recommendations<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
) -> StoreResult<Vec<book::Model>> {
    get_account(db, account_id).await?;

    Ok(BookEntity::find()
        .join(JoinType::InnerJoin, recommend_book::Relation::Book.def().rev())
        .filter(recommend_book::Column::AccountId.eq(account_id))
        .order_by_asc(book::Column::Id)
        .all(db)
        .await?)
}

pub async fn add_recommendation<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    book_id: i32,
) -> StoreResult<()> {
    get_account(db, account_id).await?;
    books::get_book(db, book_id).await?;

    if RecommendBookEntity::find_by_id((account_id, book_id))
        .one(db)
        .await?
        .is_none()
    {
        let row = recommend_book::ActiveModel {
            account_id: Set(account_id),
            book_id: Set(book_id),
        };
        RecommendBookEntity::insert(row).exec(db).await?;
    }
    Ok(())
}
