use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::entities::{
    book::{self, Entity as BookEntity},
    order::{self, decode_order_id, Entity as OrderEntity, State},
    order_book::{self, Entity as OrderBookEntity},
    shop_cart::{self, Entity as ShopCartEntity},
};
use crate::error::{StoreError, StoreResult};
use crate::repository::{accounts, books};

/// A line item joined with its book.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderLine {
    pub book: book::Model,
    pub quantity: i32,
}

pub async fn get_order<C: ConnectionTrait>(db: &C, id: i32) -> StoreResult<order::Model> {
    OrderEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(StoreError::NotFound { entity: "order", id })
}

/// Looks an order up by the opaque id produced by [`order::Model::opaque_id`].
pub async fn find_by_opaque_id<C: ConnectionTrait>(
    db: &C,
    opaque: &str,
) -> StoreResult<order::Model> {
    let Some(id) = decode_order_id(opaque) else {
        warn!(opaque, "Rejected undecodable order id");
        return Err(StoreError::InvalidOrderId);
    };
    get_order(db, id).await
}

/// Orders of one account, newest first.
pub async fn list_for_account<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
) -> StoreResult<Vec<order::Model>> {
    Ok(OrderEntity::find()
        .filter(order::Column::AccountId.eq(account_id))
        .order_by_desc(order::Column::Date)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?)
}

/// Every order, newest first.
pub async fn list_orders<C: ConnectionTrait>(db: &C) -> StoreResult<Vec<order::Model>> {
    Ok(OrderEntity::find()
        .order_by_desc(order::Column::Date)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?)
}

/// Line items in insertion order.
pub async fn order_lines<C: ConnectionTrait>(db: &C, order_id: i32) -> StoreResult<Vec<OrderLine>> {
    let rows = OrderBookEntity::find()
        .filter(order_book::Column::OrderId.eq(order_id))
        .order_by_asc(order_book::Column::Id)
        .find_also_related(BookEntity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(line, book)| {
            book.map(|book| OrderLine {
                book,
                quantity: line.quantity,
            })
        })
        .collect())
}

/// `"empty"`, or `"<name>*<qty>"` per line joined with `" + "`.
pub fn describe(lines: &[OrderLine]) -> String {
    if lines.is_empty() {
        return "empty".to_owned();
    }
    lines
        .iter()
        .map(|line| format!("{}*{}", line.book.name, line.quantity))
        .collect::<Vec<_>>()
        .join(" + ")
}

pub fn total_price(lines: &[OrderLine]) -> f64 {
    lines
        .iter()
        .map(|line| line.book.price * f64::from(line.quantity))
        .sum()
}

pub async fn description<C: ConnectionTrait>(db: &C, order_id: i32) -> StoreResult<String> {
    Ok(describe(&order_lines(db, order_id).await?))
}

pub async fn total_price_of<C: ConnectionTrait>(db: &C, order_id: i32) -> StoreResult<f64> {
    Ok(total_price(&order_lines(db, order_id).await?))
}

/// Creates an unfinished order dated now with `(book_id, quantity)` lines.
pub async fn create_order<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    lines: &[(i32, i32)],
) -> StoreResult<order::Model> {
    accounts::get_account(db, account_id).await?;
    for &(book_id, quantity) in lines {
        if quantity < 1 {
            return Err(StoreError::InvalidInput(format!(
                "Quantity for book {book_id} must be at least 1"
            )));
        }
        books::get_book(db, book_id).await?;
    }

    let order = order::ActiveModel {
        state: Set(State::Unfinished),
        account_id: Set(account_id),
        date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for &(book_id, quantity) in lines {
        order_book::ActiveModel {
            order_id: Set(order.id),
            book_id: Set(book_id),
            quantity: Set(quantity),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    info!(id = order.id, account_id, lines = lines.len(), "Created order");
    Ok(order)
}

/// Turns the account's cart into a new order and empties the cart.
pub async fn checkout(db: &DatabaseConnection, account_id: i32) -> StoreResult<order::Model> {
    let txn = db.begin().await?;

    let cart = ShopCartEntity::find()
        .filter(shop_cart::Column::AccountId.eq(account_id))
        .order_by_asc(shop_cart::Column::Id)
        .all(&txn)
        .await?;

    if cart.is_empty() {
        txn.rollback().await?;
        return Err(StoreError::InvalidInput("Cart is empty".to_owned()));
    }

    let lines: Vec<(i32, i32)> = cart.iter().map(|row| (row.book_id, row.quantity)).collect();
    let order = match create_order(&txn, account_id, &lines).await {
        Ok(order) => order,
        Err(err) => {
            txn.rollback().await?;
            return Err(err);
        }
    };

    ShopCartEntity::delete_many()
        .filter(shop_cart::Column::AccountId.eq(account_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    debug!(order_id = order.id, account_id, "Checked out cart");
    Ok(order)
}

pub async fn set_state<C: ConnectionTrait>(
    db: &C,
    id: i32,
    state: State,
) -> StoreResult<order::Model> {
    let mut order: order::ActiveModel = get_order(db, id).await?.into();
    order.state = Set(state);
    let order = order.update(db).await?;
    info!(id, state = %state, "Changed order state");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::carts::{add_to_cart, cart_lines};
    use crate::test_utils::{create_test_account, create_test_book, setup_test_db};
    use base64::{engine::general_purpose::STANDARD, Engine};

    #[tokio::test]
    async fn order_without_lines_is_empty() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "buyer").await?;
        let order = create_order(&db, account.id, &[]).await?;

        assert_eq!(description(&db, order.id).await?, "empty");
        assert_eq!(total_price_of(&db, order.id).await?, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn description_lists_lines_in_insertion_order() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "buyer").await?;
        let alice = create_test_book(&db, "Alice in Wonderland", 10.0).await?;
        let orwell = create_test_book(&db, "1984", 5.5).await?;
        let order = create_order(&db, account.id, &[(alice.id, 2), (orwell.id, 1)]).await?;

        assert_eq!(
            description(&db, order.id).await?,
            "Alice in Wonderland*2 + 1984*1"
        );
        Ok(())
    }

    #[tokio::test]
    async fn total_price_sums_unit_price_times_quantity() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "buyer").await?;
        let first = create_test_book(&db, "Ten", 10.0).await?;
        let second = create_test_book(&db, "Five and a half", 5.5).await?;
        let order = create_order(&db, account.id, &[(first.id, 3), (second.id, 2)]).await?;

        assert_eq!(total_price_of(&db, order.id).await?, 41.0);
        Ok(())
    }

    #[tokio::test]
    async fn opaque_id_finds_the_order() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "buyer").await?;
        let order = create_order(&db, account.id, &[]).await?;

        let found = find_by_opaque_id(&db, &order.opaque_id()).await?;
        assert_eq!(found.id, order.id);
        Ok(())
    }

    #[tokio::test]
    async fn opaque_id_failures() -> StoreResult<()> {
        let db = setup_test_db().await?;

        assert!(matches!(
            find_by_opaque_id(&db, "%%%").await,
            Err(StoreError::InvalidOrderId)
        ));
        assert!(matches!(
            find_by_opaque_id(&db, &STANDARD.encode("17")).await,
            Err(StoreError::InvalidOrderId)
        ));
        assert!(matches!(
            find_by_opaque_id(&db, &STANDARD.encode("999|2020-01-01")).await,
            Err(StoreError::NotFound { id: 999, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn orders_are_listed_newest_first() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "buyer").await?;
        let older = create_order(&db, account.id, &[]).await?;
        let newer = create_order(&db, account.id, &[]).await?;

        let ids: Vec<i32> = list_for_account(&db, account.id)
            .await?
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_lines_leave_no_order_behind() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "buyer").await?;
        let book = create_test_book(&db, "Real", 1.0).await?;

        assert!(matches!(
            create_order(&db, account.id, &[(book.id, 1), (book.id, 0)]).await,
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            create_order(&db, account.id, &[(book.id, 1), (999, 1)]).await,
            Err(StoreError::NotFound { id: 999, .. })
        ));
        assert!(list_for_account(&db, account.id).await?.is_empty());
        assert!(OrderBookEntity::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn all_orders_are_listed_newest_first() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let first = create_test_account(&db, "buyer").await?;
        let second = create_test_account(&db, "other").await?;
        let older = create_order(&db, first.id, &[]).await?;
        let newer = create_order(&db, second.id, &[]).await?;

        let ids: Vec<i32> = list_orders(&db).await?.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        Ok(())
    }

    #[tokio::test]
    async fn checkout_moves_cart_into_order() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "buyer").await?;
        let book = create_test_book(&db, "Cart book", 2.5).await?;
        add_to_cart(&db, account.id, book.id, 3).await?;

        let order = checkout(&db, account.id).await?;
        assert_eq!(order.state, State::Unfinished);
        assert_eq!(description(&db, order.id).await?, "Cart book*3");
        assert!(cart_lines(&db, account.id).await?.is_empty());

        assert!(matches!(
            checkout(&db, account.id).await,
            Err(StoreError::InvalidInput(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn state_can_be_changed() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, "buyer").await?;
        let order = create_order(&db, account.id, &[]).await?;

        let order = set_state(&db, order.id, State::Completed).await?;
        assert_eq!(get_order(&db, order.id).await?.state, State::Completed);
        Ok(())
    }
}
