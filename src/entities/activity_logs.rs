use sea_orm::entity::prelude::*;

/// Append-only audit trail. The application never updates or deletes rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "activity_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub event_type: String,

    pub description: String,

    pub user_id: Option<i32>,

    /// JSON blob of free-form context
    pub metadata: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
