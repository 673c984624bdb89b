use sea_orm::entity::prelude::*;

/// One row per calendar date, created lazily on the first visit of the day.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "visitor_stats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// YYYY-MM-DD
    #[sea_orm(unique)]
    pub date: String,

    pub views: i64,

    pub unique_visitors: i64,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
