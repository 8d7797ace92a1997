use sea_orm::entity::prelude::*;
use serde::Serialize;
use std::fmt;

/// Characters kept by [`Model::header_description`] before the ellipsis.
pub const HEADER_DESCRIPTION_LEN: usize = 200;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub isbn: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub publish_date: Date,
    pub price: f64,
    pub publisher: String,
    pub page_number: i32,
    pub language: String,
    pub cover_image: String,
}

impl Model {
    /// Description cut down to 200 characters, with `...` appended when cut.
    pub fn header_description(&self) -> String {
        let mut chars = self.description.chars();
        let head: String = chars.by_ref().take(HEADER_DESCRIPTION_LEN).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::entities::order_book::Entity")]
    OrderBook,
    #[sea_orm(has_many = "crate::entities::shop_cart::Entity")]
    ShopCart,
    #[sea_orm(has_many = "crate::entities::comment::Entity")]
    Comment,
}

impl Related<crate::entities::order_book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderBook.def()
    }
}

impl Related<crate::entities::shop_cart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShopCart.def()
    }
}

impl Related<crate::entities::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<crate::entities::order::Entity> for Entity {
    fn to() -> RelationDef {
        crate::entities::order_book::Relation::Order.def()
    }

    fn via() -> Option<RelationDef> {
        Some(crate::entities::order_book::Relation::Book.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
