use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::FieldErrors;
use super::{AccreditationDto, ApiError, AppState};
use crate::db::{AccreditationFilter, AccreditationUpsert};

/// Filters arrive as raw strings; empty values mean "not filtered", matching
/// how the public site calls these endpoints.
#[derive(Deserialize)]
pub struct AccreditationQuery {
    pub year: Option<String>,
    pub month: Option<String>,
    pub region: Option<String>,
    pub limit: Option<String>,
}

#[derive(Deserialize)]
pub struct AccreditationPayload {
    pub paripurna: Option<f64>,
    pub utama: Option<f64>,
    pub madya: Option<f64>,
    #[serde(default)]
    pub recorded_at: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<i32>,
    #[serde(default)]
    pub region: Option<String>,
}

fn parse_int(value: Option<&String>) -> Option<i32> {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

fn normalize_region(value: Option<String>) -> Option<String> {
    value
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

/// GET /akreditasi — latest row for the filters; zeros when nothing matches.
/// Without a region filter only the authority-wide rows (region IS NULL)
/// are considered.
pub async fn latest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccreditationQuery>,
) -> Result<Json<AccreditationDto>, ApiError> {
    let filter = AccreditationFilter {
        year: parse_int(query.year.as_ref()),
        month: parse_int(query.month.as_ref()),
        region: normalize_region(query.region),
    };

    let row = state.store().latest_accreditation(filter).await?;

    Ok(Json(row.map_or_else(
        AccreditationDto::empty,
        AccreditationDto::from,
    )))
}

/// POST /akreditasi — upsert keyed by (year, month, region)
pub async fn upsert(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<AccreditationPayload>,
) -> Result<Json<AccreditationDto>, ApiError> {
    let mut errors = FieldErrors::new();
    for (field, value) in [
        ("paripurna", payload.paripurna),
        ("utama", payload.utama),
        ("madya", payload.madya),
    ] {
        match value {
            Some(v) if v >= 0.0 => {}
            Some(_) => errors.add(field, "The value must be at least 0"),
            None => errors.add(field, "The field is required"),
        }
    }
    if payload.year.is_some_and(|y| !(2000..=2100).contains(&y)) {
        errors.add("year", "The year must be between 2000 and 2100");
    }
    if payload.month.is_some_and(|m| !(1..=12).contains(&m)) {
        errors.add("month", "The month must be between 1 and 12");
    }
    if payload.region.as_ref().is_some_and(|r| r.len() > 191) {
        errors.add("region", "The region may not be greater than 191 characters");
    }
    errors.into_result()?;

    let region = normalize_region(payload.region);
    let recorded_at = resolve_recorded_at(
        payload.recorded_at.as_deref(),
        payload.year,
        payload.month,
    )?;

    #[allow(clippy::cast_possible_truncation)]
    let stat = state
        .store()
        .upsert_accreditation(AccreditationUpsert {
            paripurna: payload.paripurna.unwrap_or(0.0).round() as i32,
            utama: payload.utama.unwrap_or(0.0).round() as i32,
            madya: payload.madya.unwrap_or(0.0).round() as i32,
            year: payload.year,
            month: payload.month,
            region,
            recorded_at,
        })
        .await?;

    let dto = AccreditationDto::from(stat);

    state
        .activity()
        .log(
            "akreditasi.updated",
            "Statistik akreditasi diperbarui.",
            Some(&actor),
            serde_json::to_value(&dto).ok(),
        )
        .await?;

    Ok(Json(dto))
}

/// GET /akreditasi/history — newest first, limit clamped to 1..=500
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccreditationQuery>,
) -> Result<Json<Vec<AccreditationDto>>, ApiError> {
    let filter = AccreditationFilter {
        year: parse_int(query.year.as_ref()),
        month: parse_int(query.month.as_ref()),
        region: normalize_region(query.region),
    };

    let limit = query
        .limit
        .as_deref()
        .and_then(|l| l.parse::<u64>().ok())
        .unwrap_or(120)
        .clamp(1, 500);

    let rows = state.store().accreditation_history(filter, limit).await?;

    Ok(Json(rows.into_iter().map(AccreditationDto::from).collect()))
}

/// Recorded-at precedence: explicit value, then first day of (year, month),
/// then now.
fn resolve_recorded_at(
    recorded_at: Option<&str>,
    year: Option<i32>,
    month: Option<i32>,
) -> Result<String, ApiError> {
    if let Some(value) = recorded_at.filter(|v| !v.is_empty()) {
        if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(value) {
            return Ok(parsed.with_timezone(&Utc).to_rfc3339());
        }
        if let Ok(date) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
            return Ok(Utc.from_utc_datetime(&midnight).to_rfc3339());
        }
        return Err(ApiError::validation("The recorded_at is not a valid date"));
    }

    if let (Some(year), Some(month)) = (year, month)
        && let chrono::LocalResult::Single(dt) =
            Utc.with_ymd_and_hms(year, month as u32, 1, 0, 0, 0)
    {
        return Ok(dt.to_rfc3339());
    }

    Ok(Utc::now().to_rfc3339())
}
