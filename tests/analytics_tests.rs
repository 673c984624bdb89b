use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use dinkes_portal::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // In-memory SQLite lives per connection; keep the pool at one
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = dinkes_portal::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    dinkes_portal::api::router(state)
}

async fn track(
    app: &Router,
    session: Option<&str>,
    count_view: bool,
) -> (StatusCode, serde_json::Value, Option<String>) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/analytics/track")
        .header("Content-Type", "application/json");
    if let Some(session) = session {
        builder = builder.header("X-Visitor-Session", session);
    }

    let body = serde_json::json!({ "count_view": count_view });
    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();

    (status, json, cookie)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();

    (status, json)
}

#[tokio::test]
async fn first_visit_counts_once_per_day() {
    let app = spawn_app().await;

    let (status, body, cookie) = track(&app, Some("sess-alpha"), false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "sess-alpha");
    assert_eq!(body["today"]["views"], 1);
    assert_eq!(body["today"]["unique_visitors"], 1);
    assert!(body["active_now"].as_u64().unwrap() >= 1);
    assert!(cookie.unwrap().contains("visitor_session=sess-alpha"));

    // Same session, same day: nothing moves without an explicit view
    let (_, body, _) = track(&app, Some("sess-alpha"), false).await;
    assert_eq!(body["today"]["views"], 1);
    assert_eq!(body["today"]["unique_visitors"], 1);

    // An explicit count_view bumps views but not uniques
    let (_, body, _) = track(&app, Some("sess-alpha"), true).await;
    assert_eq!(body["today"]["views"], 2);
    assert_eq!(body["today"]["unique_visitors"], 1);
}

#[tokio::test]
async fn distinct_sessions_count_as_distinct_uniques() {
    let app = spawn_app().await;

    track(&app, Some("sess-one"), false).await;
    let (_, body, _) = track(&app, Some("sess-two"), false).await;

    assert_eq!(body["today"]["unique_visitors"], 2);
    assert_eq!(body["today"]["views"], 2);
    assert!(body["active_now"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn server_mints_a_session_id_when_absent() {
    let app = spawn_app().await;

    let (status, body, cookie) = track(&app, None, false).await;
    assert_eq!(status, StatusCode::OK);

    let session_id = body["session_id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(session_id).is_ok());
    assert!(cookie.unwrap().contains(&format!("visitor_session={session_id}")));

    // Reusing the minted id does not create a second unique
    let (_, body, _) = track(&app, Some(session_id), false).await;
    assert_eq!(body["today"]["unique_visitors"], 1);
}

#[tokio::test]
async fn summary_is_read_only() {
    let app = spawn_app().await;

    track(&app, Some("sess-summary"), false).await;

    let (status, first) = get_json(&app, "/analytics/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["today"]["views"], 1);
    assert_eq!(first["today"]["unique_visitors"], 1);

    // Calling it again moves nothing
    let (_, second) = get_json(&app, "/analytics/summary").await;
    assert_eq!(second["today"]["views"], 1);
    assert_eq!(second["today"]["unique_visitors"], 1);
}

#[tokio::test]
async fn summary_is_zeroed_before_any_visit() {
    let app = spawn_app().await;

    let (status, body) = get_json(&app, "/analytics/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_now"], 0);
    assert_eq!(body["today"]["views"], 0);
    assert_eq!(body["today"]["unique_visitors"], 0);
}

#[tokio::test]
async fn stats_returns_daily_rows_oldest_first() {
    let app = spawn_app().await;

    track(&app, Some("sess-stats"), true).await;

    let (status, body) = get_json(&app, "/analytics/stats?days=7").await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["views"], 1);
    assert_eq!(rows[0]["unique_visitors"], 1);

    // The clamp keeps absurd ranges in bounds rather than failing
    let (status, _) = get_json(&app, "/analytics/stats?days=100000").await;
    assert_eq!(status, StatusCode::OK);
}
