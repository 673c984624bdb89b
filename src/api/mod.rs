use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod accreditation;
pub mod activity;
pub mod admin_users;
pub mod analytics;
pub mod auth;
pub mod documents;
mod error;
pub mod indicators;
pub mod profile;
mod types;
mod validation;

pub use error::{ApiError, ErrorBody};
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn limiter(&self) -> &crate::services::RateLimiter {
        &self.shared.limiter
    }

    #[must_use]
    pub fn recaptcha(&self) -> &crate::services::RecaptchaService {
        &self.shared.recaptcha
    }

    #[must_use]
    pub fn analytics(&self) -> &crate::services::VisitorAnalyticsService {
        &self.shared.analytics
    }

    #[must_use]
    pub fn activity(&self) -> &crate::services::ActivityLogger {
        &self.shared.activity
    }

    #[must_use]
    pub fn storage(&self) -> &crate::services::DocumentStorage {
        &self.shared.storage
    }
}

#[must_use]
pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

async fn ping() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "message": "pong" }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let storage_root = state.storage().root().to_path_buf();
    let max_upload = usize::try_from(state.storage().max_upload_bytes()).unwrap_or(usize::MAX);

    let public_routes = Router::new()
        .route("/ping", get(ping))
        .route("/akreditasi", get(accreditation::latest))
        .route("/akreditasi/history", get(accreditation::history))
        .route("/indikators", get(indicators::list))
        .route("/documents", get(documents::list))
        .route("/documents/{id}/download", get(documents::download))
        .route("/analytics/track", post(analytics::track))
        .route("/analytics/stats", get(analytics::stats))
        .route("/analytics/summary", get(analytics::summary))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let authed_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/profile", put(profile::update))
        .route("/activity/logs", get(activity::list))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let admin_routes = Router::new()
        .route("/akreditasi", post(accreditation::upsert))
        .route("/indikators", post(indicators::create))
        .route("/indikators/{id}", put(indicators::update))
        .route("/indikators/{id}", delete(indicators::destroy))
        .route("/indikators/replace", post(indicators::replace))
        .route("/documents", post(documents::upload))
        .route("/documents/{id}", put(documents::update))
        // POST alias kept for multipart clients that cannot send PUT
        .route("/documents/{id}", post(documents::update))
        .route("/documents/{id}", delete(documents::destroy))
        .route("/admin/users", get(admin_users::list))
        .route("/admin/users", post(admin_users::create))
        .route("/admin/users/{id}", put(admin_users::update))
        .route("/admin/users/{id}", delete(admin_users::destroy))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authed_routes)
        .merge(admin_routes)
        .nest_service(
            "/storage",
            tower_http::services::ServeDir::new(storage_root),
        )
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors_layer(state.config()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Exact allow-list plus an optional wildcard-subdomain pattern, with
/// credentials enabled. Wildcard origins cannot be used with credentials,
/// hence the predicate.
fn cors_layer(config: &Config) -> CorsLayer {
    let allowed: Vec<String> = config.server.cors_allowed_origins.clone();
    let pattern = config
        .server
        .cors_origin_pattern
        .as_deref()
        .and_then(|p| regex::Regex::new(p).ok());

    let origin_predicate = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let Ok(origin) = origin.to_str() else {
            return false;
        };

        allowed.iter().any(|a| a == origin)
            || pattern.as_ref().is_some_and(|p| p.is_match(origin))
    });

    CorsLayer::new()
        .allow_origin(origin_predicate)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-visitor-session"),
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(true)
}
