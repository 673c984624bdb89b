use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    pub description: Option<String>,

    pub category: Option<String>,

    /// Path relative to the content store root
    pub file_path: Option<String>,

    /// Original client file name
    pub file_name: Option<String>,

    pub mime_type: Option<String>,

    pub file_size: Option<i64>,

    pub published_at: Option<String>,

    pub created_by: Option<i32>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
