use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ActivityLogDto, ApiError, AppState, LogActorDto};

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<u64>,
}

/// GET /activity/logs — newest first, limit clamped to 1..=100
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityLogDto>>, ApiError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let entries = state.store().recent_activity(limit).await?;

    let dtos = entries
        .into_iter()
        .map(|(log, actor)| ActivityLogDto {
            id: log.id,
            event_type: log.event_type,
            description: log.description,
            metadata: log
                .metadata
                .as_deref()
                .and_then(|m| serde_json::from_str(m).ok()),
            created_at: log.created_at,
            user: actor.map(|a| LogActorDto {
                id: a.id,
                username: a.username,
                name: a.name,
            }),
        })
        .collect();

    Ok(Json(dtos))
}
