use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{FieldErrors, valid_email, valid_role};
use super::{ApiError, AppState, AuthResponse, StatusOk, UserDto};
use crate::db::{NewUser, User, repositories::user as user_repo};

/// Authenticated user resolved by the middleware, available to handlers via
/// request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

// ============================================================================
// Request types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
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
    pub city: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
    #[serde(default)]
    pub admin_code: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolve `Authorization: Bearer <token>` to a live user and stash it in
/// the request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_user(&state, request.headers()).await?;
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Same as [`require_auth`] but additionally demands the admin role.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_user(&state, request.headers()).await?;
    if !user.is_admin() {
        return Err(ApiError::Forbidden);
    }
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;

    let auth_token = state
        .store()
        .find_live_token(&token)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    state
        .store()
        .get_user(auth_token.user_id)
        .await?
        .ok_or(ApiError::Unauthorized)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Client address for throttling. Proxy headers first, the raw peer address
/// is not available behind the fronting server anyway.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| "unknown".to_string(), str::to_string)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let ip = client_ip(&headers);
    if state.limiter().blocked("register", &ip) {
        return Err(ApiError::RateLimited { ip });
    }

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
    if payload.city.is_empty() || payload.city.len() > 255 {
        errors.add("city", "The city is required (max 255 characters)");
    }
    if payload.institution.is_empty() || payload.institution.len() > 255 {
        errors.add(
            "institution",
            "The institution is required (max 255 characters)",
        );
    }
    errors.into_result()?;

    if payload.role == "admin" {
        let verified = state
            .recaptcha()
            .verify(payload.recaptcha_token.as_deref(), "register")
            .await;
        if !verified {
            state.limiter().record_failure("register", &ip);
            return Err(ApiError::RecaptchaFailed);
        }

        if let Some(expected) = state.config().auth.admin_code.as_deref()
            && payload.admin_code.as_deref() != Some(expected)
        {
            state.limiter().record_failure("register", &ip);
            return Err(ApiError::InvalidAdminCode);
        }
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
            city: Some(payload.city),
            institution: Some(payload.institution),
            password_hash,
        })
        .await?;

    let token = state
        .store()
        .issue_token(user.id, state.config().auth.token_ttl_days)
        .await?;

    state.limiter().clear("register", &ip);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: token.token,
            user: UserDto::from(user),
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let ip = client_ip(&headers);
    if state.limiter().blocked("login", &ip) {
        return Err(ApiError::RateLimited { ip });
    }

    let mut errors = FieldErrors::new();
    if !valid_email(&payload.email) {
        errors.add("email", "The email must be a valid email address");
    }
    if payload.password.is_empty() {
        errors.add("password", "The password is required");
    }
    errors.into_result()?;

    let verified = state
        .recaptcha()
        .verify(payload.recaptcha_token.as_deref(), "login")
        .await;
    if !verified {
        state.limiter().record_failure("login", &ip);
        return Err(ApiError::RecaptchaFailed);
    }

    let Some((user, password_hash)) =
        state.store().get_user_by_email_with_hash(&payload.email).await?
    else {
        state.limiter().record_failure("login", &ip);
        return Err(ApiError::InvalidCredentials);
    };

    if !user_repo::verify_password(&payload.password, &password_hash).await? {
        state.limiter().record_failure("login", &ip);
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .store()
        .issue_token(user.id, state.config().auth.token_ttl_days)
        .await?;

    state.limiter().clear("login", &ip);

    Ok(Json(AuthResponse {
        token: token.token,
        user: UserDto::from(user),
    }))
}

/// POST /auth/logout — idempotent, unknown tokens are a no-op
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusOk>, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        state.store().delete_token(&token).await?;
    }

    Ok(Json(StatusOk::new()))
}

/// GET /auth/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserDto> {
    Json(UserDto::from(user))
}
