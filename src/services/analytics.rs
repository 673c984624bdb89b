use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::Store;

/// Sessions seen within this window count as "active now"
const ACTIVE_WINDOW_MINUTES: i64 = 5;

const MAX_STAT_DAYS: u64 = 90;

#[derive(Debug, Clone, Serialize)]
pub struct DailyStat {
    pub date: String,
    pub views: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitorSummary {
    pub active_now: u64,
    pub today: DailyStat,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackOutcome {
    pub session_id: String,
    pub active_now: u64,
    pub today: DailyStat,
}

#[derive(Clone)]
pub struct VisitorAnalyticsService {
    store: Store,
}

impl VisitorAnalyticsService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Record a visit. A session is counted once per calendar date for the
    /// unique-visitor figure; views also bump on every explicit
    /// `count_view`. The session row is refreshed either way.
    pub async fn track(
        &self,
        session_id: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
        count_view: bool,
    ) -> Result<TrackOutcome> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let today = now.date_naive().to_string();

        let session_id = session_id
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let user_agent = user_agent.map(|ua| ua.chars().take(500).collect::<String>());

        let existing = self.store.find_visitor_session(&session_id).await?;
        let is_new_today = match &existing {
            None => true,
            Some(session) => session.last_counted_at.as_deref() != Some(today.as_str()),
        };

        match existing {
            Some(session) => {
                self.store
                    .touch_visitor_session(session, ip_address, user_agent, &now_str, &today)
                    .await?;
            }
            None => {
                self.store
                    .create_visitor_session(&session_id, ip_address, user_agent, &now_str, &today)
                    .await?;
            }
        }

        let add_unique = i64::from(is_new_today);
        let add_views = i64::from(count_view || is_new_today);
        let stat = self.store.bump_visitor_stat(&today, add_views, add_unique).await?;

        let active_now = self.count_active(now).await?;

        Ok(TrackOutcome {
            session_id,
            active_now,
            today: DailyStat {
                date: today,
                views: stat.views,
                unique_visitors: stat.unique_visitors,
            },
        })
    }

    /// Daily rows for the last `days` days (clamped to 1..=90), oldest first
    pub async fn recent_stats(&self, days: u64) -> Result<Vec<DailyStat>> {
        let days = days.clamp(1, MAX_STAT_DAYS);

        let mut rows = self.store.recent_visitor_stats(days).await?;
        rows.sort_by(|a, b| a.date.cmp(&b.date));

        Ok(rows
            .into_iter()
            .map(|row| DailyStat {
                date: row.date,
                views: row.views,
                unique_visitors: row.unique_visitors,
            })
            .collect())
    }

    /// Read-only snapshot of today's counters and the active gauge
    pub async fn current_summary(&self) -> Result<VisitorSummary> {
        let now = Utc::now();
        let today = now.date_naive().to_string();

        let stat = self.store.find_visitor_stat(&today).await?;
        let active_now = self.count_active(now).await?;

        Ok(VisitorSummary {
            active_now,
            today: DailyStat {
                date: today,
                views: stat.as_ref().map_or(0, |s| s.views),
                unique_visitors: stat.as_ref().map_or(0, |s| s.unique_visitors),
            },
        })
    }

    async fn count_active(&self, now: chrono::DateTime<Utc>) -> Result<u64> {
        let threshold = (now - Duration::minutes(ACTIVE_WINDOW_MINUTES)).to_rfc3339();
        self.store.count_active_sessions(&threshold).await
    }
}
