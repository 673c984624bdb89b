use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{FieldErrors, valid_email};
use super::{ApiError, AppState, UserDto};
use crate::db::{UserUpdate, repositories::user as user_repo};

/// Self-service profile update. `photoUrl` is accepted as a legacy alias
/// for `photo_url`.
#[derive(Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub institution: Option<Option<String>>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub photo_url: Option<Option<String>>,
    #[serde(
        default,
        rename = "photoUrl",
        deserialize_with = "super::validation::double_option"
    )]
    pub photo_url_alias: Option<Option<String>>,
}

/// PUT /profile
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let mut errors = FieldErrors::new();
    if payload
        .name
        .as_ref()
        .is_some_and(|n| n.is_empty() || n.len() > 255)
    {
        errors.add("name", "The name is required (max 255 characters)");
    }
    if let Some(email) = &payload.email {
        if !valid_email(email) {
            errors.add("email", "The email must be a valid email address");
        } else if state.store().email_taken(email, Some(user.id)).await? {
            errors.add("email", "The email has already been taken");
        }
    }
    if payload
        .phone
        .as_ref()
        .is_some_and(|p| p.as_ref().is_some_and(|p| p.len() > 30))
    {
        errors.add("phone", "The phone may not be greater than 30 characters");
    }
    if payload.password.as_ref().is_some_and(|p| p.len() < 6) {
        errors.add("password", "The password must be at least 6 characters");
    }
    let photo_url = payload.photo_url.or(payload.photo_url_alias);
    if photo_url
        .as_ref()
        .is_some_and(|p| p.as_ref().is_some_and(|p| p.len() > 2048))
    {
        errors.add(
            "photo_url",
            "The photo URL may not be greater than 2048 characters",
        );
    }
    errors.into_result()?;

    let password_hash = match payload.password {
        Some(password) => Some(user_repo::hash_password(&password).await?),
        None => None,
    };

    let update = UserUpdate {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        city: payload.city,
        institution: payload.institution,
        photo_url,
        password_hash,
        ..UserUpdate::default()
    };

    let updated = state
        .store()
        .update_user(user.id, update)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(UserDto::from(updated)))
}
