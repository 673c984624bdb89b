use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use dinkes_portal::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

const SEED_ADMIN_EMAIL: &str = "admin@dinkes.local";
const SEED_ADMIN_PASSWORD: &str = "password";

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

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/auth/login",
        None,
        serde_json::json!({ "email": SEED_ADMIN_EMAIL, "password": SEED_ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn indicator_status_is_derived_when_omitted() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let (status, met) = send_json(
        &app,
        "POST",
        "/indikators",
        Some(&token),
        serde_json::json!({ "name": "Kepatuhan jam visite", "capaian": 96, "target": 95 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(met["status"], "Mencapai Target");

    let (_, not_met) = send_json(
        &app,
        "POST",
        "/indikators",
        Some(&token),
        serde_json::json!({ "name": "Waktu tunggu rawat jalan", "capaian": 89, "target": 90 }),
    )
    .await;
    assert_eq!(not_met["status"], "Tidak Mencapai Target");

    // An explicit status always wins over the derivation
    let (_, explicit) = send_json(
        &app,
        "POST",
        "/indikators",
        Some(&token),
        serde_json::json!({
            "name": "Kepuasan pasien",
            "capaian": 10,
            "target": 90,
            "status": "Dalam Evaluasi"
        }),
    )
    .await;
    assert_eq!(explicit["status"], "Dalam Evaluasi");
}

#[tokio::test]
async fn indicator_update_recomputes_only_with_both_figures() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let (_, created) = send_json(
        &app,
        "POST",
        "/indikators",
        Some(&token),
        serde_json::json!({ "name": "Respons komplain", "capaian": 80, "target": 90 }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["status"], "Tidak Mencapai Target");

    // Both figures supplied, no explicit status: recomputed
    let (status, updated) = send_json(
        &app,
        "PUT",
        &format!("/indikators/{id}"),
        Some(&token),
        serde_json::json!({ "capaian": 95, "target": 90 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Mencapai Target");
    assert_eq!(updated["capaian"], 95.0);

    // Renaming alone leaves the status untouched
    let (_, renamed) = send_json(
        &app,
        "PUT",
        &format!("/indikators/{id}"),
        Some(&token),
        serde_json::json!({ "name": "Respons komplain 24 jam" }),
    )
    .await;
    assert_eq!(renamed["name"], "Respons komplain 24 jam");
    assert_eq!(renamed["status"], "Mencapai Target");
}

#[tokio::test]
async fn indicator_delete_removes_the_row() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let (_, created) = send_json(
        &app,
        "POST",
        "/indikators",
        Some(&token),
        serde_json::json!({ "name": "Sementara" }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/indikators/{id}"),
        Some(&token),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/indikators/{id}"),
        Some(&token),
        serde_json::json!({ "name": "Hantu" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn replace_swaps_the_whole_set() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    // Four rows come seeded
    let (_, before) = send_json(&app, "GET", "/indikators", None, serde_json::json!({})).await;
    assert_eq!(before.as_array().unwrap().len(), 4);

    let (status, replaced) = send_json(
        &app,
        "POST",
        "/indikators/replace",
        Some(&token),
        serde_json::json!({ "items": [
            { "name": "Indikator baru A", "capaian": 97, "target": 95 },
            { "name": "Indikator baru B", "capaian": 70, "target": 80 },
        ]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rows = replaced.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let statuses: Vec<&str> = rows.iter().map(|r| r["status"].as_str().unwrap()).collect();
    assert!(statuses.contains(&"Mencapai Target"));
    assert!(statuses.contains(&"Tidak Mencapai Target"));

    let (_, after) = send_json(&app, "GET", "/indikators", None, serde_json::json!({})).await;
    assert_eq!(after.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn rejected_replace_leaves_existing_rows_alone() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    // The nameless second item fails validation before anything is touched
    let (status, body) = send_json(
        &app,
        "POST",
        "/indikators/replace",
        Some(&token),
        serde_json::json!({ "items": [
            { "name": "Valid", "capaian": 50, "target": 40 },
            { "capaian": 10, "target": 20 },
        ]}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");

    let (_, after) = send_json(&app, "GET", "/indikators", None, serde_json::json!({})).await;
    assert_eq!(after.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn indicator_list_filters_by_region_and_status() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    send_json(
        &app,
        "POST",
        "/indikators",
        Some(&token),
        serde_json::json!({ "name": "Regional", "region": "Banjar", "capaian": 99, "target": 90 }),
    )
    .await;

    let (_, by_region) = send_json(
        &app,
        "GET",
        "/indikators?region=Banjar",
        None,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(by_region.as_array().unwrap().len(), 1);
    assert_eq!(by_region[0]["name"], "Regional");

    let (_, by_status) = send_json(
        &app,
        "GET",
        "/indikators?status=Mencapai%20Target",
        None,
        serde_json::json!({}),
    )
    .await;
    assert!(
        by_status
            .as_array()
            .unwrap()
            .iter()
            .all(|r| r["status"] == "Mencapai Target")
    );
}

#[tokio::test]
async fn accreditation_upsert_is_keyed_by_period() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    // Seeded authority-wide row answers the unfiltered read
    let (status, seeded) = send_json(&app, "GET", "/akreditasi", None, serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seeded["paripurna"], 45);

    let (status, stored) = send_json(
        &app,
        "POST",
        "/akreditasi",
        Some(&token),
        serde_json::json!({
            "paripurna": 50, "utama": 30, "madya": 20,
            "year": 2025, "month": 6, "region": "Banjar"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let first_id = stored["id"].as_i64().unwrap();

    // Same period: the row is updated in place, not duplicated
    let (_, updated) = send_json(
        &app,
        "POST",
        "/akreditasi",
        Some(&token),
        serde_json::json!({
            "paripurna": 60, "utama": 25, "madya": 15,
            "year": 2025, "month": 6, "region": "Banjar"
        }),
    )
    .await;
    assert_eq!(updated["id"].as_i64().unwrap(), first_id);
    assert_eq!(updated["paripurna"], 60);

    let (_, filtered) = send_json(
        &app,
        "GET",
        "/akreditasi?year=2025&month=6&region=Banjar",
        None,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(filtered["paripurna"], 60);

    // Without a region filter, only authority-wide rows are considered
    let (_, unfiltered) = send_json(&app, "GET", "/akreditasi", None, serde_json::json!({})).await;
    assert_eq!(unfiltered["paripurna"], 45);
}

#[tokio::test]
async fn accreditation_values_are_rounded() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let (_, stored) = send_json(
        &app,
        "POST",
        "/akreditasi",
        Some(&token),
        serde_json::json!({
            "paripurna": 45.6, "utama": 34.4, "madya": 20.0,
            "year": 2024, "month": 1
        }),
    )
    .await;
    assert_eq!(stored["paripurna"], 46);
    assert_eq!(stored["utama"], 34);
    assert_eq!(stored["madya"], 20);
    assert!(stored["recorded_at"].as_str().unwrap().starts_with("2024-01-01"));
}

#[tokio::test]
async fn accreditation_history_lists_newest_first() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    for (year, month) in [(2024, 5), (2025, 2)] {
        send_json(
            &app,
            "POST",
            "/akreditasi",
            Some(&token),
            serde_json::json!({
                "paripurna": 40, "utama": 40, "madya": 20,
                "year": year, "month": month
            }),
        )
        .await;
    }

    let (status, body) = send_json(
        &app,
        "GET",
        "/akreditasi/history?limit=10",
        None,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert!(rows.len() >= 3);
    assert_eq!(rows[0]["year"], 2025);
    assert_eq!(rows[1]["year"], 2024);
}

#[tokio::test]
async fn mutations_land_in_the_activity_log() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    send_json(
        &app,
        "POST",
        "/indikators",
        Some(&token),
        serde_json::json!({ "name": "Tercatat", "capaian": 91, "target": 90 }),
    )
    .await;

    let (status, body) = send_json(
        &app,
        "GET",
        "/activity/logs?limit=5",
        Some(&token),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    assert!(!entries.is_empty());

    let entry = &entries[0];
    assert_eq!(entry["type"], "indicator.created");
    assert!(
        entry["description"]
            .as_str()
            .unwrap()
            .contains("Tercatat")
    );
    assert_eq!(entry["user"]["username"], "admin");
    assert!(entry["metadata"]["indicator_id"].is_i64());
}

#[tokio::test]
async fn activity_log_requires_authentication() {
    let app = spawn_app().await;

    let (status, _) = send_json(&app, "GET", "/activity/logs", None, serde_json::json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
