pub mod account;
pub mod book;
pub mod book_relation;
pub mod comment;
pub mod order;
pub mod order_book;
pub mod recommend_book;
pub mod shop_cart;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};
use tracing::info;

use crate::config::Config;
use crate::entities::{
    account::Entity as Account, book::Entity as Book, book_relation::Entity as BookRelation,
    comment::Entity as Comment, order::Entity as Order, order_book::Entity as OrderBook,
    recommend_book::Entity as RecommendBook, shop_cart::Entity as ShopCart,
};
use crate::error::StoreError;
use crate::repository::accounts;

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut tables = vec![
        schema.create_table_from_entity(Book),
        schema.create_table_from_entity(Account),
        schema.create_table_from_entity(BookRelation),
        schema.create_table_from_entity(RecommendBook),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderBook),
        schema.create_table_from_entity(ShopCart),
        schema.create_table_from_entity(Comment),
    ];

    for table in tables.iter_mut() {
        table.if_not_exists();
        db.execute(backend.build(&*table)).await?;
    }

    info!("Database schema is ready");
    Ok(())
}

/// Creates the bootstrap admin account when one is configured and missing.
pub async fn primary_setup(db: &DatabaseConnection, config: &Config) -> Result<(), StoreError> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    if accounts::find_by_username(db, username).await?.is_some() {
        return Ok(());
    }

    accounts::create_account(
        db,
        accounts::NewAccount {
            username: username.clone(),
            password: password.clone(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            address: String::new(),
        },
        account::Role::Admin,
    )
    .await?;

    info!(username = %username, "Created bootstrap admin account");
    Ok(())
}
