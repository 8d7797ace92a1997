use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use tracing::debug;

use crate::entities::{
    book::{self, Entity as BookEntity},
    shop_cart::{self, Entity as ShopCartEntity},
};
use crate::error::{StoreError, StoreResult};
use crate::repository::{accounts, books};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartLine {
    pub id: i32,
    pub book: book::Model,
    pub quantity: i32,
}

pub async fn cart_lines<C: ConnectionTrait>(db: &C, account_id: i32) -> StoreResult<Vec<CartLine>> {
    let rows = ShopCartEntity::find()
        .filter(shop_cart::Column::AccountId.eq(account_id))
        .order_by_asc(shop_cart::Column::Id)
        .find_also_related(BookEntity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(row, book)| {
            book.map(|book| CartLine {
                id: row.id,
                book,
                quantity: row.quantity,
            })
        })
        .collect())
}

/// Adds a book to the cart. An existing row for the same book grows instead
/// of a second row being created; the flag tells which happened.
pub async fn add_to_cart<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    book_id: i32,
    quantity: i32,
) -> StoreResult<(shop_cart::Model, bool)> {
    if quantity < 1 {
        return Err(StoreError::InvalidInput(
            "Quantity should be greater than 0".to_owned(),
        ));
    }
    accounts::get_account(db, account_id).await?;
    books::get_book(db, book_id).await?;

    let existing = ShopCartEntity::find()
        .filter(shop_cart::Column::AccountId.eq(account_id))
        .filter(shop_cart::Column::BookId.eq(book_id))
        .one(db)
        .await?;

    if let Some(entry) = existing {
        let total = entry.quantity + quantity;
        let mut entry: shop_cart::ActiveModel = entry.into();
        entry.quantity = Set(total);
        let entry = entry.update(db).await?;
        debug!(account_id, book_id, quantity = total, "Grew cart entry");
        return Ok((entry, false));
    }

    let entry = shop_cart::ActiveModel {
        account_id: Set(account_id),
        book_id: Set(book_id),
        quantity: Set(quantity),
        ..Default::default()
    }
    .insert(db)
    .await?;
    debug!(account_id, book_id, quantity, "Added cart entry");
    Ok((entry, true))
}

async fn own_entry<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    entry_id: i32,
) -> StoreResult<shop_cart::Model> {
    ShopCartEntity::find_by_id(entry_id)
        .filter(shop_cart::Column::AccountId.eq(account_id))
        .one(db)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "cart entry",
            id: entry_id,
        })
}

/// Sets the quantity of a cart row; zero removes it and yields `None`.
pub async fn set_quantity<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    entry_id: i32,
    quantity: i32,
) -> StoreResult<Option<shop_cart::Model>> {
    if quantity < 0 {
        return Err(StoreError::InvalidInput(
            "Quantity cannot be negative".to_owned(),
        ));
    }
    let entry = own_entry(db, account_id, entry_id).await?;

    if quantity == 0 {
        entry.delete(db).await?;
        return Ok(None);
    }

    let mut entry: shop_cart::ActiveModel = entry.into();
    entry.quantity = Set(quantity);
    Ok(Some(entry.update(db).await?))
}

pub async fn remove_entry<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    entry_id: i32,
) -> StoreResult<()> {
    own_entry(db, account_id, entry_id).await?.delete(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_account, create_test_book, setup_test_db};

    #[tokio::test]
    async fn adding_same_book_twice_grows_one_row() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "shopper").await?;
        let book = create_test_book(&db, "Cart", 1.0).await?;

        let (_, created) = add_to_cart(&db, account.id, book.id, 2).await?;
        assert!(created);
        let (entry, created) = add_to_cart(&db, account.id, book.id, 3).await?;
        assert!(!created);
        assert_eq!(entry.quantity, 5);

        let lines = cart_lines(&db, account.id).await?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].book, book);
        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_removes_entry() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "shopper").await?;
        let book = create_test_book(&db, "Cart", 1.0).await?;
        let (entry, _) = add_to_cart(&db, account.id, book.id, 2).await?;

        let updated = set_quantity(&db, account.id, entry.id, 7).await?;
        assert_eq!(updated.map(|e| e.quantity), Some(7));

        assert_eq!(set_quantity(&db, account.id, entry.id, 0).await?, None);
        assert!(cart_lines(&db, account.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn entries_of_other_accounts_are_invisible() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let owner = create_test_account(&db, "owner").await?;
        let other = create_test_account(&db, "other").await?;
        let book = create_test_book(&db, "Cart", 1.0).await?;
        let (entry, _) = add_to_cart(&db, owner.id, book.id, 1).await?;

        assert!(matches!(
            remove_entry(&db, other.id, entry.id).await,
            Err(StoreError::NotFound { .. })
        ));
        remove_entry(&db, owner.id, entry.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "shopper").await?;
        let book = create_test_book(&db, "Cart", 1.0).await?;
        assert!(matches!(
            add_to_cart(&db, account.id, book.id, 0).await,
            Err(StoreError::InvalidInput(_))
        ));
        Ok(())
    }
}
