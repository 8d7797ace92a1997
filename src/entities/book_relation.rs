use sea_orm::entity::prelude::*;
use serde::Serialize;

// Related books are symmetrical, every link is stored in both directions.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "book_relations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub from_book_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub to_book_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::book::Entity",
        from = "Column::FromBookId",
        to = "crate::entities::book::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    FromBook,
    #[sea_orm(
        belongs_to = "crate::entities::book::Entity",
        from = "Column::ToBookId",
        to = "crate::entities::book::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    ToBook,
}

impl ActiveModelBehavior for ActiveModel {}
