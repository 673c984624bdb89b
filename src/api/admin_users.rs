use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{FieldErrors, valid_email, valid_role};
use super::{ApiError, AppState, StatusOk, UserDto};
use crate::db::{NewUser, UserUpdate, repositories::user as user_repo};

#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::validation::double_option")]
    pub institution: Option<Option<String>>,
    pub role: Option<String>,
    pub password: Option<String>,
}

/// GET /admin/users — newest first
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state.store().list_users().await?;

    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// POST /admin/users
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let mut errors = FieldErrors::new();
    if payload.username.is_empty() || payload.username.len() > 255 {
        errors.add("username", "The username is required (max 255 characters)");
    } else if state.store().username_taken(&payload.username).await? {
        errors.add("username", "The username has already been taken");
    }
    if payload.password.len() < 6 {
        errors.add("password", "The password must be at least 6 characters");
    }
    if !valid_email(&payload.email) {
        errors.add("email", "The email must be a valid email address");
    } else if state.store().email_taken(&payload.email, None).await? {
        errors.add("email", "The email has already been taken");
    }
    if payload.phone.as_ref().is_some_and(|p| p.len() > 30) {
        errors.add("phone", "The phone may not be greater than 30 characters");
    }
    if !valid_role(&payload.role) {
        errors.add("role", "The role must be admin or member");
    }
    if payload.full_name.is_empty() || payload.full_name.len() > 255 {
        errors.add("full_name", "The full name is required (max 255 characters)");
    }
    errors.into_result()?;

    // Creating another admin always demands verification; member creation
    // only verifies a token when one was supplied.
    if payload.role == "admin" {
        if !state
            .recaptcha()
            .verify(payload.recaptcha_token.as_deref(), "create_admin")
            .await
        {
            return Err(ApiError::RecaptchaFailed);
        }
    } else if let Some(token) = payload.recaptcha_token.as_deref().filter(|t| !t.is_empty())
        && !state.recaptcha().verify(Some(token), "register").await
    {
        return Err(ApiError::RecaptchaFailed);
    }

    let password_hash = user_repo::hash_password(&payload.password).await?;

    let user = state
        .store()
        .create_user(NewUser {
            name: payload.full_name,
            username: payload.username,
            email: payload.email,
            phone: payload.phone,
            role: payload.role,
            city: payload.city,
            institution: payload.institution,
            password_hash,
        })
        .await?;

    state
        .activity()
        .log(
            "user.created",
            &format!("User \"{}\" ({}) dibuat.", user.username, user.role),
            Some(&actor),
            Some(serde_json::json!({ "user_id": user.id })),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// PUT /admin/users/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
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
        } else if state.store().email_taken(email, Some(id)).await? {
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
    if payload.role.as_ref().is_some_and(|r| !valid_role(r)) {
        errors.add("role", "The role must be admin or member");
    }
    if payload.password.as_ref().is_some_and(|p| p.len() < 6) {
        errors.add("password", "The password must be at least 6 characters");
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
        role: payload.role,
        city: payload.city,
        institution: payload.institution,
        password_hash,
        ..UserUpdate::default()
    };

    let user = state
        .store()
        .update_user(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    state
        .activity()
        .log(
            "user.updated",
            &format!("User \"{}\" diperbarui.", user.username),
            Some(&actor),
            Some(serde_json::json!({ "user_id": user.id })),
        )
        .await?;

    Ok(Json(UserDto::from(user)))
}

/// DELETE /admin/users/{id} — an admin cannot delete their own account
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<StatusOk>, ApiError> {
    if actor.id == id {
        return Err(ApiError::CannotDeleteSelf);
    }

    let user = state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    state.store().delete_user(id).await?;

    state
        .activity()
        .log(
            "user.deleted",
            &format!("User \"{}\" dihapus.", user.username),
            Some(&actor),
            Some(serde_json::json!({ "user_id": user.id })),
        )
        .await?;

    Ok(Json(StatusOk::new()))
}
