use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::{accreditation_stats, prelude::*};

/// Filters for reading accreditation rows. A `None` region on the latest
/// lookup matches rows without a region (the authority-wide figures).
#[derive(Debug, Clone, Default)]
pub struct AccreditationFilter {
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AccreditationUpsert {
    pub paripurna: i32,
    pub utama: i32,
    pub madya: i32,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub region: Option<String>,
    pub recorded_at: String,
}

pub struct AccreditationRepository {
    conn: DatabaseConnection,
}

impl AccreditationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn ordered() -> sea_orm::Select<AccreditationStats> {
        AccreditationStats::find()
            .order_by_desc(accreditation_stats::Column::Year)
            .order_by_desc(accreditation_stats::Column::Month)
            .order_by_desc(accreditation_stats::Column::RecordedAt)
            .order_by_desc(accreditation_stats::Column::UpdatedAt)
            .order_by_desc(accreditation_stats::Column::CreatedAt)
    }

    pub async fn latest(
        &self,
        filter: AccreditationFilter,
    ) -> Result<Option<accreditation_stats::Model>> {
        let mut query = Self::ordered();

        if let Some(year) = filter.year {
            query = query.filter(accreditation_stats::Column::Year.eq(year));
        }
        if let Some(month) = filter.month {
            query = query.filter(accreditation_stats::Column::Month.eq(month));
        }
        query = match filter.region {
            Some(region) => query.filter(accreditation_stats::Column::Region.eq(region)),
            None => query.filter(accreditation_stats::Column::Region.is_null()),
        };

        let row = query
            .one(&self.conn)
            .await
            .context("Failed to query accreditation stat")?;

        Ok(row)
    }

    pub async fn history(
        &self,
        filter: AccreditationFilter,
        limit: u64,
    ) -> Result<Vec<accreditation_stats::Model>> {
        let mut query = Self::ordered();

        if let Some(year) = filter.year {
            query = query.filter(accreditation_stats::Column::Year.eq(year));
        }
        if let Some(month) = filter.month {
            query = query.filter(accreditation_stats::Column::Month.eq(month));
        }
        if let Some(region) = filter.region {
            query = query.filter(accreditation_stats::Column::Region.eq(region));
        }

        let rows = query
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query accreditation history")?;

        Ok(rows)
    }

    /// Insert-or-update keyed by (year, month, region)
    pub async fn upsert(&self, data: AccreditationUpsert) -> Result<accreditation_stats::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut query = AccreditationStats::find();
        query = match data.year {
            Some(year) => query.filter(accreditation_stats::Column::Year.eq(year)),
            None => query.filter(accreditation_stats::Column::Year.is_null()),
        };
        query = match data.month {
            Some(month) => query.filter(accreditation_stats::Column::Month.eq(month)),
            None => query.filter(accreditation_stats::Column::Month.is_null()),
        };
        query = match &data.region {
            Some(region) => query.filter(accreditation_stats::Column::Region.eq(region.clone())),
            None => query.filter(accreditation_stats::Column::Region.is_null()),
        };

        let existing = query
            .one(&self.conn)
            .await
            .context("Failed to query accreditation stat for upsert")?;

        let model = match existing {
            Some(row) => {
                let mut active: accreditation_stats::ActiveModel = row.into();
                active.paripurna = Set(data.paripurna);
                active.utama = Set(data.utama);
                active.madya = Set(data.madya);
                active.recorded_at = Set(Some(data.recorded_at));
                active.updated_at = Set(now);
                active
                    .update(&self.conn)
                    .await
                    .context("Failed to update accreditation stat")?
            }
            None => {
                let active = accreditation_stats::ActiveModel {
                    paripurna: Set(data.paripurna),
                    utama: Set(data.utama),
                    madya: Set(data.madya),
                    year: Set(data.year),
                    month: Set(data.month),
                    region: Set(data.region),
                    recorded_at: Set(Some(data.recorded_at)),
                    created_at: Set(now.clone()),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active
                    .insert(&self.conn)
                    .await
                    .context("Failed to insert accreditation stat")?
            }
        };

        Ok(model)
    }
}
