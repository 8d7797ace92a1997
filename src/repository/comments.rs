use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::info;

use crate::entities::{
    account::{self, Entity as AccountEntity},
    comment::{self, Entity as CommentEntity},
};
use crate::error::{StoreError, StoreResult};
use crate::repository::{accounts, books};

pub const MAX_COMMENT_LEN: usize = 2000;

/// A comment together with its author's username.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub book_id: i32,
    pub username: String,
    pub content: String,
    pub date: chrono::DateTime<Utc>,
}

impl CommentView {
    fn new(comment: comment::Model, author: account::Model) -> CommentView {
        CommentView {
            id: comment.id,
            book_id: comment.book_id,
            username: author.username,
            content: comment.content,
            date: comment.date,
        }
    }
}

pub async fn create_comment<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    book_id: i32,
    content: String,
) -> StoreResult<comment::Model> {
    if content.trim().is_empty() || content.chars().count() > MAX_COMMENT_LEN {
        return Err(StoreError::InvalidInput(format!(
            "Comment must be between 1 and {MAX_COMMENT_LEN} characters"
        )));
    }
    accounts::get_account(db, account_id).await?;
    books::get_book(db, book_id).await?;

    let comment = comment::ActiveModel {
        book_id: Set(book_id),
        account_id: Set(account_id),
        content: Set(content),
        date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = comment.id, book_id, account_id, "Created comment");
    Ok(comment)
}

/// Username of the account that wrote the comment.
pub async fn user_info<C: ConnectionTrait>(db: &C, comment: &comment::Model) -> StoreResult<String> {
    Ok(accounts::get_account(db, comment.account_id).await?.username)
}

/// Comments on a book, newest first.
pub async fn comments_for_book<C: ConnectionTrait>(
    db: &C,
    book_id: i32,
) -> StoreResult<Vec<CommentView>> {
    books::get_book(db, book_id).await?;

    let rows = CommentEntity::find()
        .filter(comment::Column::BookId.eq(book_id))
        .order_by_desc(comment::Column::Date)
        .order_by_desc(comment::Column::Id)
        .find_also_related(AccountEntity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(comment, author)| author.map(|author| CommentView::new(comment, author)))
        .collect())
}

pub async fn delete_comment<C: ConnectionTrait>(db: &C, id: i32) -> StoreResult<()> {
    let result = CommentEntity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(StoreError::NotFound {
            entity: "comment",
            id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_account, create_test_book, setup_test_db};

    #[tokio::test]
    async fn user_info_is_author_username() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let author = create_test_account(&db, "critic").await?;
        let book = create_test_book(&db, "Reviewed", 1.0).await?;
        let comment = create_comment(&db, author.id, book.id, "Great read".to_owned()).await?;

        assert_eq!(user_info(&db, &comment).await?, "critic");
        assert!(comment.to_string().starts_with("Comment on "));
        Ok(())
    }

    #[tokio::test]
    async fn comments_are_listed_newest_first() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let author = create_test_account(&db, "critic").await?;
        let book = create_test_book(&db, "Reviewed", 1.0).await?;
        create_comment(&db, author.id, book.id, "first".to_owned()).await?;
        create_comment(&db, author.id, book.id, "second".to_owned()).await?;

        let contents: Vec<String> = comments_for_book(&db, book.id)
            .await?
            .into_iter()
            .map(|c| c.content)
            .collect();
        assert_eq!(contents, vec!["second", "first"]);
        Ok(())
    }

    #[tokio::test]
    async fn blank_and_oversized_comments_are_rejected() -> StoreResult<()> {
        let db = setup_test_db().await?;
        let author = create_test_account(&db, "critic").await?;
        let book = create_test_book(&db, "Reviewed", 1.0).await?;

        let padded = format!("{}{}", "x".repeat(MAX_COMMENT_LEN), " ".repeat(500));
        for content in ["   ".to_owned(), "x".repeat(MAX_COMMENT_LEN + 1), padded] {
            assert!(matches!(
                create_comment(&db, author.id, book.id, content).await,
                Err(StoreError::InvalidInput(_))
            ));
        }

        let longest = create_comment(&db, author.id, book.id, "x".repeat(MAX_COMMENT_LEN)).await?;
        assert_eq!(longest.content.chars().count(), MAX_COMMENT_LEN);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_missing_comment_is_not_found() -> StoreResult<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            delete_comment(&db, 5).await,
            Err(StoreError::NotFound { id: 5, .. })
        ));
        Ok(())
    }
}
