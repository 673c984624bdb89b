use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::{prelude::*, visitor_sessions, visitor_stats};

pub struct VisitorRepository {
    conn: DatabaseConnection,
}

impl VisitorRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_session(&self, session_id: &str) -> Result<Option<visitor_sessions::Model>> {
        let session = VisitorSessions::find()
            .filter(visitor_sessions::Column::SessionId.eq(session_id))
            .one(&self.conn)
            .await
            .context("Failed to query visitor session")?;

        Ok(session)
    }

    pub async fn create_session(
        &self,
        session_id: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
        last_seen: &str,
        last_counted_at: &str,
    ) -> Result<visitor_sessions::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = visitor_sessions::ActiveModel {
            session_id: Set(session_id.to_string()),
            ip_address: Set(ip_address),
            user_agent: Set(user_agent),
            last_seen: Set(last_seen.to_string()),
            last_counted_at: Set(Some(last_counted_at.to_string())),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert visitor session")?;

        Ok(model)
    }

    pub async fn touch_session(
        &self,
        session: visitor_sessions::Model,
        ip_address: Option<String>,
        user_agent: Option<String>,
        last_seen: &str,
        last_counted_at: &str,
    ) -> Result<()> {
        let mut active: visitor_sessions::ActiveModel = session.into();
        active.ip_address = Set(ip_address);
        active.user_agent = Set(user_agent);
        active.last_seen = Set(last_seen.to_string());
        active.last_counted_at = Set(Some(last_counted_at.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to update visitor session")?;

        Ok(())
    }

    /// Sessions seen at or after the threshold instant
    pub async fn count_active(&self, threshold: &str) -> Result<u64> {
        let count = VisitorSessions::find()
            .filter(visitor_sessions::Column::LastSeen.gte(threshold))
            .count(&self.conn)
            .await
            .context("Failed to count active sessions")?;

        Ok(count)
    }

    pub async fn find_stat(&self, date: &str) -> Result<Option<visitor_stats::Model>> {
        let stat = VisitorStats::find()
            .filter(visitor_stats::Column::Date.eq(date))
            .one(&self.conn)
            .await
            .context("Failed to query visitor stat")?;

        Ok(stat)
    }

    /// Read-modify-write on the daily counters. Racing requests for the same
    /// date can lose an increment; acceptable for approximate analytics.
    pub async fn bump_stat(
        &self,
        date: &str,
        add_views: i64,
        add_unique: i64,
    ) -> Result<visitor_stats::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = match self.find_stat(date).await? {
            Some(stat) => {
                let views = stat.views + add_views;
                let unique = stat.unique_visitors + add_unique;
                let mut active: visitor_stats::ActiveModel = stat.into();
                active.views = Set(views);
                active.unique_visitors = Set(unique);
                active.updated_at = Set(now);
                active
                    .update(&self.conn)
                    .await
                    .context("Failed to update visitor stat")?
            }
            None => {
                let active = visitor_stats::ActiveModel {
                    date: Set(date.to_string()),
                    views: Set(add_views),
                    unique_visitors: Set(add_unique),
                    created_at: Set(now.clone()),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active
                    .insert(&self.conn)
                    .await
                    .context("Failed to insert visitor stat")?
            }
        };

        Ok(model)
    }

    /// The `days` most recent daily rows, newest first
    pub async fn recent_stats(&self, days: u64) -> Result<Vec<visitor_stats::Model>> {
        let rows = VisitorStats::find()
            .order_by_desc(visitor_stats::Column::Date)
            .limit(days)
            .all(&self.conn)
            .await
            .context("Failed to query visitor stats")?;

        Ok(rows)
    }
}
