use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{activity_logs, prelude::*};

/// Actor attached to a log entry at read time
#[derive(Debug, Clone)]
pub struct ActorBrief {
    pub id: i32,
    pub username: String,
    pub name: String,
}

pub struct ActivityRepository {
    conn: DatabaseConnection,
}

impl ActivityRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        event_type: &str,
        description: &str,
        user_id: Option<i32>,
        metadata: Option<String>,
    ) -> Result<()> {
        let active = activity_logs::ActiveModel {
            event_type: Set(event_type.to_string()),
            description: Set(description.to_string()),
            user_id: Set(user_id),
            metadata: Set(metadata),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        ActivityLogs::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert activity log")?;

        Ok(())
    }

    /// Newest entries first, actors resolved with a second explicit query
    /// rather than an ORM relationship.
    pub async fn recent(
        &self,
        limit: u64,
    ) -> Result<Vec<(activity_logs::Model, Option<ActorBrief>)>> {
        let logs = ActivityLogs::find()
            .order_by_desc(activity_logs::Column::CreatedAt)
            .order_by_desc(activity_logs::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query activity logs")?;

        let mut user_ids: Vec<i32> = logs.iter().filter_map(|l| l.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let briefs = if user_ids.is_empty() {
            Vec::new()
        } else {
            Users::find()
                .filter(crate::entities::users::Column::Id.is_in(user_ids))
                .all(&self.conn)
                .await
                .context("Failed to query log actors")?
        };

        let entries = logs
            .into_iter()
            .map(|log| {
                let actor = log.user_id.and_then(|id| {
                    briefs.iter().find(|u| u.id == id).map(|u| ActorBrief {
                        id: u.id,
                        username: u.username.clone(),
                        name: u.name.clone(),
                    })
                });
                (log, actor)
            })
            .collect();

        Ok(entries)
    }

    /// Retention hook for operators; the API itself never deletes entries.
    pub async fn prune_older_than(&self, cutoff: &str) -> Result<u64> {
        let result = ActivityLogs::delete_many()
            .filter(activity_logs::Column::CreatedAt.lt(cutoff))
            .exec(&self.conn)
            .await
            .context("Failed to prune activity logs")?;

        Ok(result.rows_affected)
    }
}
