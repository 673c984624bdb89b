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

const BOUNDARY: &str = "portal-test-boundary";

async fn spawn_app(storage_root: &std::path::Path) -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // In-memory SQLite lives per connection; keep the pool at one
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.storage.root_path = storage_root.to_string_lossy().to_string();

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

fn text_part(name: &str, value: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
    )
}

fn file_part(file_name: &str, mime_type: &str, contents: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
         filename=\"{file_name}\"\r\nContent-Type: {mime_type}\r\n\r\n"
    )
    .into_bytes();
    part.extend_from_slice(contents);
    part.extend_from_slice(b"\r\n");
    part
}

fn multipart_body(parts: Vec<Vec<u8>>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(&part);
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send_multipart(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Vec<u8>,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::from(body))
                .unwrap(),
        )
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

#[tokio::test]
async fn upload_then_list_reflects_real_file_attributes() {
    let dir = tempfile::tempdir().unwrap();
    let app = spawn_app(dir.path()).await;
    let token = admin_token(&app).await;

    let contents = b"%PDF-1.4 laporan tahunan".to_vec();
    let body = multipart_body(vec![
        text_part("title", "Laporan Tahunan").into_bytes(),
        text_part("description", "Laporan kinerja 2025").into_bytes(),
        text_part("category", "laporan").into_bytes(),
        file_part("laporan-2025.pdf", "application/pdf", &contents),
    ]);

    let (status, created) = send_multipart(&app, "POST", "/documents", &token, body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Laporan Tahunan");
    assert_eq!(created["file_name"], "laporan-2025.pdf");
    assert_eq!(created["mime_type"], "application/pdf");
    assert_eq!(created["file_size"].as_u64().unwrap(), contents.len() as u64);
    assert!(created["published_at"].is_string());

    let (status, listed) = send_json(&app, "GET", "/documents", None, serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let rows = listed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["file_size"].as_u64().unwrap(), contents.len() as u64);
    assert_eq!(rows[0]["mime_type"], "application/pdf");
    assert!(
        rows[0]["file_url"]
            .as_str()
            .unwrap()
            .starts_with("/storage/documents/")
    );
}

#[tokio::test]
async fn download_streams_the_binary_with_its_original_name() {
    let dir = tempfile::tempdir().unwrap();
    let app = spawn_app(dir.path()).await;
    let token = admin_token(&app).await;

    let contents = b"%PDF-1.4 unduhan".to_vec();
    let body = multipart_body(vec![
        text_part("title", "Unduhan").into_bytes(),
        file_part("unduhan.pdf", "application/pdf", &contents),
    ]);

    let (_, created) = send_multipart(&app, "POST", "/documents", &token, body).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/documents/{id}/download"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("unduhan.pdf"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), contents.as_slice());
}

#[tokio::test]
async fn disallowed_extension_is_rejected_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let app = spawn_app(dir.path()).await;
    let token = admin_token(&app).await;

    let body = multipart_body(vec![
        text_part("title", "Payload").into_bytes(),
        file_part("payload.exe", "application/octet-stream", b"MZ"),
    ]);

    let (status, response) = send_multipart(&app, "POST", "/documents", &token, body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["code"], "validation_error");

    // Nothing was stored
    assert!(!dir.path().join("documents").exists());

    let (_, listed) = send_json(&app, "GET", "/documents", None, serde_json::json!({})).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn upload_requires_title_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = spawn_app(dir.path()).await;
    let token = admin_token(&app).await;

    let body = multipart_body(vec![text_part("description", "tanpa judul").into_bytes()]);

    let (status, response) = send_multipart(&app, "POST", "/documents", &token, body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["details"]["title"][0].is_string());
    assert!(response["details"]["file"][0].is_string());
}

#[tokio::test]
async fn update_replaces_metadata_and_binary() {
    let dir = tempfile::tempdir().unwrap();
    let app = spawn_app(dir.path()).await;
    let token = admin_token(&app).await;

    let body = multipart_body(vec![
        text_part("title", "Draf").into_bytes(),
        file_part("draf.txt", "text/plain", b"v1"),
    ]);
    let (_, created) = send_multipart(&app, "POST", "/documents", &token, body).await;
    let id = created["id"].as_i64().unwrap();
    let old_url = created["file_url"].as_str().unwrap().to_string();

    let body = multipart_body(vec![
        text_part("title", "Final").into_bytes(),
        file_part("final.txt", "text/plain", b"v2 final"),
    ]);
    let (status, updated) =
        send_multipart(&app, "PUT", &format!("/documents/{id}"), &token, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["file_name"], "final.txt");
    assert_eq!(updated["file_size"].as_u64().unwrap(), 8);

    // The old binary is gone from the store
    let old_relative = old_url.trim_start_matches("/storage/");
    assert!(!dir.path().join(old_relative).exists());
}

#[tokio::test]
async fn delete_removes_row_and_binary() {
    let dir = tempfile::tempdir().unwrap();
    let app = spawn_app(dir.path()).await;
    let token = admin_token(&app).await;

    let body = multipart_body(vec![
        text_part("title", "Sekali pakai").into_bytes(),
        file_part("sekali.pdf", "application/pdf", b"%PDF-1.4 x"),
    ]);
    let (_, created) = send_multipart(&app, "POST", "/documents", &token, body).await;
    let id = created["id"].as_i64().unwrap();
    let relative = created["file_url"]
        .as_str()
        .unwrap()
        .trim_start_matches("/storage/")
        .to_string();
    assert!(dir.path().join(&relative).exists());

    let (status, body) = send_json(
        &app,
        "DELETE",
        &format!("/documents/{id}"),
        Some(&token),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(!dir.path().join(&relative).exists());

    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/documents/{id}"),
        Some(&token),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_photo_upload_updates_the_uploader() {
    let dir = tempfile::tempdir().unwrap();
    let app = spawn_app(dir.path()).await;
    let token = admin_token(&app).await;

    let body = multipart_body(vec![
        text_part("title", "Foto profil").into_bytes(),
        text_part("category", "profile-photo").into_bytes(),
        file_part("foto.png", "image/png", b"\x89PNG fake"),
    ]);

    let (status, created) = send_multipart(&app, "POST", "/documents", &token, body).await;
    assert_eq!(status, StatusCode::CREATED);
    let file_url = created["file_url"].as_str().unwrap().to_string();

    let (_, me) = send_json(&app, "GET", "/auth/me", Some(&token), serde_json::json!({})).await;
    assert_eq!(me["photo_url"].as_str().unwrap(), file_url);
}

#[tokio::test]
async fn uploads_are_admin_only() {
    let dir = tempfile::tempdir().unwrap();
    let app = spawn_app(dir.path()).await;

    let body = multipart_body(vec![
        text_part("title", "Anonim").into_bytes(),
        file_part("anonim.pdf", "application/pdf", b"%PDF"),
    ]);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/documents")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
