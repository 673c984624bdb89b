use sea_orm::entity::prelude::*;

/// Accreditation level percentages, one row per (year, month, region) period.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accreditation_stats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub paripurna: i32,

    pub utama: i32,

    pub madya: i32,

    pub year: Option<i32>,

    pub month: Option<i32>,

    pub region: Option<String>,

    /// RFC3339 instant the figures refer to
    pub recorded_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
