use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "visitor_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub session_id: String,

    pub ip_address: Option<String>,

    pub user_agent: Option<String>,

    /// RFC3339, refreshed on every track call
    pub last_seen: String,

    /// Date (YYYY-MM-DD) this session was last counted as a unique visitor
    pub last_counted_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
