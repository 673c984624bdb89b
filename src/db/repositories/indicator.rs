use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entities::{indicators, prelude::*};

pub const STATUS_MET: &str = "Mencapai Target";
pub const STATUS_NOT_MET: &str = "Tidak Mencapai Target";

/// Derived status when the caller supplies none: met when capaian reaches
/// target. A zero target never derives a status.
pub fn derive_status(capaian: Option<f64>, target: Option<f64>) -> Option<String> {
    match (capaian, target) {
        (Some(c), Some(t)) if t != 0.0 => Some(if c >= t {
            STATUS_MET.to_string()
        } else {
            STATUS_NOT_MET.to_string()
        }),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct NewIndicator {
    pub name: String,
    pub region: Option<String>,
    pub capaian: Option<f64>,
    pub target: Option<f64>,
    pub status: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorUpdate {
    pub name: Option<String>,
    pub region: Option<Option<String>>,
    pub capaian: Option<Option<f64>>,
    pub target: Option<Option<f64>>,
    pub status: Option<Option<String>>,
    pub date: Option<Option<String>>,
}

pub struct IndicatorRepository {
    conn: DatabaseConnection,
}

impl IndicatorRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        region: Option<String>,
        status: Option<String>,
    ) -> Result<Vec<indicators::Model>> {
        let mut query = Indicators::find()
            .order_by_desc(indicators::Column::CreatedAt)
            .order_by_desc(indicators::Column::Id);

        if let Some(region) = region {
            query = query.filter(indicators::Column::Region.eq(region));
        }
        if let Some(status) = status {
            query = query.filter(indicators::Column::Status.eq(status));
        }

        let rows = query
            .all(&self.conn)
            .await
            .context("Failed to list indicators")?;

        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<Option<indicators::Model>> {
        let row = Indicators::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query indicator")?;

        Ok(row)
    }

    pub async fn create(&self, data: NewIndicator) -> Result<indicators::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = indicators::ActiveModel {
            name: Set(data.name),
            region: Set(data.region),
            capaian: Set(data.capaian),
            target: Set(data.target),
            status: Set(data.status),
            date: Set(data.date),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert indicator")?;

        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        update: IndicatorUpdate,
    ) -> Result<Option<indicators::Model>> {
        let Some(row) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: indicators::ActiveModel = row.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(region) = update.region {
            active.region = Set(region);
        }
        if let Some(capaian) = update.capaian {
            active.capaian = Set(capaian);
        }
        if let Some(target) = update.target {
            active.target = Set(target);
        }
        if let Some(status) = update.status {
            active.status = Set(status);
        }
        if let Some(date) = update.date {
            active.date = Set(date);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update indicator")?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Indicators::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete indicator")?;

        Ok(result.rows_affected > 0)
    }

    /// Atomically clear the whole set and insert the replacement. Runs in a
    /// transaction: a failed insert leaves the previous rows untouched.
    pub async fn replace(&self, items: Vec<NewIndicator>) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin replace transaction")?;

        Indicators::delete_many()
            .exec(&txn)
            .await
            .context("Failed to clear indicators")?;

        if !items.is_empty() {
            let records: Vec<indicators::ActiveModel> = items
                .into_iter()
                .map(|data| indicators::ActiveModel {
                    name: Set(data.name),
                    region: Set(data.region),
                    capaian: Set(data.capaian),
                    target: Set(data.target),
                    status: Set(data.status),
                    date: Set(data.date),
                    created_at: Set(now.clone()),
                    updated_at: Set(now.clone()),
                    ..Default::default()
                })
                .collect();

            Indicators::insert_many(records)
                .exec(&txn)
                .await
                .context("Failed to insert replacement indicators")?;
        }

        txn.commit()
            .await
            .context("Failed to commit replace transaction")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_met_when_capaian_reaches_target() {
        assert_eq!(
            derive_status(Some(96.0), Some(95.0)).as_deref(),
            Some(STATUS_MET)
        );
        assert_eq!(
            derive_status(Some(95.0), Some(95.0)).as_deref(),
            Some(STATUS_MET)
        );
    }

    #[test]
    fn status_not_met_below_target() {
        assert_eq!(
            derive_status(Some(89.0), Some(90.0)).as_deref(),
            Some(STATUS_NOT_MET)
        );
    }

    #[test]
    fn no_status_without_both_values_or_with_zero_target() {
        assert_eq!(derive_status(None, Some(90.0)), None);
        assert_eq!(derive_status(Some(50.0), None), None);
        assert_eq!(derive_status(Some(50.0), Some(0.0)), None);
    }
}
