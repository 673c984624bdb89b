use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::client_ip;
use super::{ApiError, AppState};
use crate::services::{DailyStat, VisitorSummary};

/// Cookie lifetime for the visitor session id (30 days)
const SESSION_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 30;

#[derive(Deserialize, Default)]
pub struct TrackRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub count_view: bool,
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub days: Option<u64>,
}

/// POST /analytics/track
///
/// The session id comes from the `X-Visitor-Session` header or the body;
/// without one the server mints a UUID and hands it back in a cookie.
pub async fn track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<TrackRequest>>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.unwrap_or_default();

    let session_id = headers
        .get("x-visitor-session")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .or(payload.session_id);

    let ip = client_ip(&headers);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let outcome = state
        .analytics()
        .track(session_id, Some(ip), user_agent, payload.count_view)
        .await?;

    let cookie = format!(
        "visitor_session={}; Max-Age={}; Path=/; SameSite=Lax",
        outcome.session_id, SESSION_COOKIE_MAX_AGE
    );

    let mut response = Json(outcome).into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }

    Ok(response)
}

/// GET /analytics/stats?days=N — oldest first
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<DailyStat>>, ApiError> {
    let days = query.days.unwrap_or(14);
    let stats = state.analytics().recent_stats(days).await?;

    Ok(Json(stats))
}

/// GET /analytics/summary — read-only, no counters move
pub async fn summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VisitorSummary>, ApiError> {
    let summary = state.analytics().current_summary().await?;

    Ok(Json(summary))
}
