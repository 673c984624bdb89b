use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{FieldErrors, valid_date};
use super::{ApiError, AppState, IndicatorDto, StatusOk};
use crate::db::{IndicatorUpdate, NewIndicator};
use crate::db::repositories::indicator::derive_status;

#[derive(Deserialize)]
pub struct IndicatorListQuery {
    pub region: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct IndicatorPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub capaian: Option<f64>,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Partial update: absent keys leave the field alone, explicit nulls clear it
#[derive(Deserialize)]
pub struct IndicatorUpdatePayload {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub region: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub capaian: Option<Option<f64>>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub target: Option<Option<f64>>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub date: Option<Option<String>>,
}

#[derive(Deserialize)]
pub struct ReplacePayload {
    #[serde(default)]
    pub items: Vec<IndicatorPayload>,
}

fn validate_payload(payload: &IndicatorPayload, errors: &mut FieldErrors, prefix: &str) {
    if payload.name.is_empty() || payload.name.len() > 255 {
        errors.add(
            &format!("{prefix}name"),
            "The name is required (max 255 characters)",
        );
    }
    if payload.region.as_ref().is_some_and(|r| r.len() > 255) {
        errors.add(
            &format!("{prefix}region"),
            "The region may not be greater than 255 characters",
        );
    }
    if payload.status.as_ref().is_some_and(|s| s.len() > 255) {
        errors.add(
            &format!("{prefix}status"),
            "The status may not be greater than 255 characters",
        );
    }
    if payload.date.as_ref().is_some_and(|d| !valid_date(d)) {
        errors.add(&format!("{prefix}date"), "The date is not a valid date");
    }
}

fn to_new_indicator(payload: IndicatorPayload) -> NewIndicator {
    let status = payload
        .status
        .or_else(|| derive_status(payload.capaian, payload.target));

    NewIndicator {
        name: payload.name,
        region: payload.region,
        capaian: payload.capaian,
        target: payload.target,
        status,
        date: payload.date,
    }
}

/// GET /indikators
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IndicatorListQuery>,
) -> Result<Json<Vec<IndicatorDto>>, ApiError> {
    let rows = state
        .store()
        .list_indicators(query.region, query.status)
        .await?;

    Ok(Json(rows.into_iter().map(IndicatorDto::from).collect()))
}

/// POST /indikators
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<IndicatorPayload>,
) -> Result<(StatusCode, Json<IndicatorDto>), ApiError> {
    let mut errors = FieldErrors::new();
    validate_payload(&payload, &mut errors, "");
    errors.into_result()?;

    let indicator = state.store().create_indicator(to_new_indicator(payload)).await?;

    state
        .activity()
        .log(
            "indicator.created",
            &format!("Indikator \"{}\" ditambahkan.", indicator.name),
            Some(&actor),
            Some(serde_json::json!({ "indicator_id": indicator.id })),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(IndicatorDto::from(indicator))))
}

/// PUT /indikators/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<IndicatorUpdatePayload>,
) -> Result<Json<IndicatorDto>, ApiError> {
    let mut errors = FieldErrors::new();
    if payload
        .name
        .as_ref()
        .is_some_and(|n| n.is_empty() || n.len() > 255)
    {
        errors.add("name", "The name is required (max 255 characters)");
    }
    if payload
        .date
        .as_ref()
        .is_some_and(|d| d.as_ref().is_some_and(|d| !valid_date(d)))
    {
        errors.add("date", "The date is not a valid date");
    }
    errors.into_result()?;

    // Recompute the derived status only when both figures were supplied
    // and no explicit status came with them.
    let status = match (&payload.status, &payload.capaian, &payload.target) {
        (None, Some(capaian), Some(target)) => Some(derive_status(*capaian, *target)),
        (explicit, _, _) => explicit.clone(),
    };

    let update = IndicatorUpdate {
        name: payload.name,
        region: payload.region,
        capaian: payload.capaian,
        target: payload.target,
        status,
        date: payload.date,
    };

    let indicator = state
        .store()
        .update_indicator(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Indicator", id))?;

    state
        .activity()
        .log(
            "indicator.updated",
            &format!("Indikator \"{}\" diperbarui.", indicator.name),
            Some(&actor),
            Some(serde_json::json!({ "indicator_id": indicator.id })),
        )
        .await?;

    Ok(Json(IndicatorDto::from(indicator)))
}

/// DELETE /indikators/{id}
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<StatusOk>, ApiError> {
    let indicator = state
        .store()
        .get_indicator(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Indicator", id))?;

    state.store().delete_indicator(id).await?;

    state
        .activity()
        .log(
            "indicator.deleted",
            &format!("Indikator \"{}\" dihapus.", indicator.name),
            Some(&actor),
            Some(serde_json::json!({ "indicator_id": indicator.id })),
        )
        .await?;

    Ok(Json(StatusOk::new()))
}

/// POST /indikators/replace — atomic clear-and-reinsert of the whole set
pub async fn replace(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<ReplacePayload>,
) -> Result<Json<Vec<IndicatorDto>>, ApiError> {
    if payload.items.is_empty() {
        return Err(ApiError::validation("The items field is required"));
    }

    let mut errors = FieldErrors::new();
    for (index, item) in payload.items.iter().enumerate() {
        validate_payload(item, &mut errors, &format!("items.{index}."));
    }
    errors.into_result()?;

    let items: Vec<NewIndicator> = payload.items.into_iter().map(to_new_indicator).collect();
    state.store().replace_indicators(items).await?;

    let fresh = state.store().list_indicators(None, None).await?;

    state
        .activity()
        .log(
            "indicator.bulk_replace",
            &format!("Indikator diganti massal sebanyak {} entri.", fresh.len()),
            Some(&actor),
            Some(serde_json::json!({ "count": fresh.len() })),
        )
        .await?;

    Ok(Json(fresh.into_iter().map(IndicatorDto::from).collect()))
}
