use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_http::services::ServeFile;

use super::auth::CurrentUser;
use super::validation::FieldErrors;
use super::{ApiError, AppState, DocumentDto, StatusOk};
use crate::db::{DocumentUpdate, NewDocument, StoredFile};
use crate::services::DocumentStorage;

/// Uploads in this category also become the uploader's profile photo
pub const PROFILE_PHOTO_CATEGORY: &str = "profile-photo";

struct UploadedFile {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct DocumentForm {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    file: Option<UploadedFile>,
}

async fn read_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<DocumentForm, ApiError> {
    let mut form = DocumentForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "title" => {
                form.title = Some(field.text().await.map_err(|e| {
                    ApiError::validation(format!("Unreadable title field: {e}"))
                })?);
            }
            "description" => {
                form.description = Some(field.text().await.map_err(|e| {
                    ApiError::validation(format!("Unreadable description field: {e}"))
                })?);
            }
            "category" => {
                form.category = Some(field.text().await.map_err(|e| {
                    ApiError::validation(format!("Unreadable category field: {e}"))
                })?);
            }
            "file" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::validation("The file must have a name"))?;

                let declared_mime = field.content_type().map(str::to_string);

                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::validation(format!("Unreadable file field: {e}"))
                })?;

                // Reject before any write: extension allow-list and ceiling
                if !state.storage().extension_allowed(&file_name) {
                    return Err(ApiError::validation("The file type is not allowed"));
                }
                if bytes.len() as u64 > state.storage().max_upload_bytes() {
                    return Err(ApiError::validation("The file exceeds the maximum size"));
                }

                let mime_type = declared_mime.unwrap_or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .to_string()
                });

                form.file = Some(UploadedFile {
                    file_name,
                    mime_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

fn validate_metadata(form: &DocumentForm, errors: &mut FieldErrors) {
    if let Some(title) = &form.title
        && title.len() > 255
    {
        errors.add("title", "The title may not be greater than 255 characters");
    }
    if let Some(category) = &form.category
        && category.len() > 100
    {
        errors.add(
            "category",
            "The category may not be greater than 100 characters",
        );
    }
}

/// GET /documents — newest first
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DocumentDto>>, ApiError> {
    let rows = state.store().list_documents().await?;

    Ok(Json(rows.into_iter().map(DocumentDto::from).collect()))
}

/// POST /documents — multipart upload
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentDto>), ApiError> {
    let form = read_form(&state, multipart).await?;

    let mut errors = FieldErrors::new();
    if form.title.as_deref().unwrap_or_default().is_empty() {
        errors.add("title", "The title is required");
    }
    if form.file.is_none() {
        errors.add("file", "The file is required");
    }
    validate_metadata(&form, &mut errors);
    errors.into_result()?;

    let title = form.title.unwrap_or_default();
    let Some(file) = form.file else {
        return Err(ApiError::validation("The file is required"));
    };

    let file_path = state
        .storage()
        .save(&file.file_name, &file.bytes)
        .await?;

    let category = form.category.filter(|c| !c.is_empty());
    let is_profile_photo = category.as_deref() == Some(PROFILE_PHOTO_CATEGORY);

    #[allow(clippy::cast_possible_wrap)]
    let document = state
        .store()
        .create_document(NewDocument {
            title,
            description: form.description.filter(|d| !d.is_empty()),
            category,
            file_path: file_path.clone(),
            file_name: file.file_name,
            mime_type: file.mime_type,
            file_size: file.bytes.len() as i64,
            created_by: Some(actor.id),
        })
        .await?;

    if is_profile_photo {
        state
            .store()
            .set_user_photo_url(actor.id, Some(DocumentStorage::public_url(&file_path)))
            .await?;
    }

    state
        .activity()
        .log(
            "document.created",
            &format!("Dokumen \"{}\" diunggah.", document.title),
            Some(&actor),
            Some(serde_json::json!({ "document_id": document.id })),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DocumentDto::from(document))))
}

/// PUT /documents/{id} — partial metadata update, optional file replacement
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<DocumentDto>, ApiError> {
    let existing = state
        .store()
        .get_document(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Document", id))?;

    let form = read_form(&state, multipart).await?;

    let mut errors = FieldErrors::new();
    if form.title.as_ref().is_some_and(String::is_empty) {
        errors.add("title", "The title is required");
    }
    validate_metadata(&form, &mut errors);
    errors.into_result()?;

    let stored_file = match form.file {
        Some(file) => {
            let file_path = state
                .storage()
                .save(&file.file_name, &file.bytes)
                .await?;

            // The replaced binary goes away best-effort
            if let Some(old_path) = &existing.file_path {
                state.storage().delete(old_path).await;
            }

            #[allow(clippy::cast_possible_wrap)]
            Some(StoredFile {
                file_path,
                file_name: file.file_name,
                mime_type: file.mime_type,
                file_size: file.bytes.len() as i64,
            })
        }
        None => None,
    };

    let update = DocumentUpdate {
        title: form.title,
        description: form.description.map(|d| (!d.is_empty()).then_some(d)),
        category: form.category.map(|c| (!c.is_empty()).then_some(c)),
        file: stored_file,
    };

    let document = state
        .store()
        .update_document(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Document", id))?;

    state
        .activity()
        .log(
            "document.updated",
            &format!("Dokumen \"{}\" diperbarui.", document.title),
            Some(&actor),
            Some(serde_json::json!({ "document_id": document.id })),
        )
        .await?;

    Ok(Json(DocumentDto::from(document)))
}

/// DELETE /documents/{id}
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<StatusOk>, ApiError> {
    let document = state
        .store()
        .delete_document(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Document", id))?;

    if let Some(file_path) = &document.file_path {
        state.storage().delete(file_path).await;
    }

    state
        .activity()
        .log(
            "document.deleted",
            &format!("Dokumen \"{}\" dihapus.", document.title),
            Some(&actor),
            Some(serde_json::json!({ "document_id": document.id })),
        )
        .await?;

    Ok(Json(StatusOk::new()))
}

/// GET /documents/{id}/download — streams the stored binary under its
/// original file name
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let document = state
        .store()
        .get_document(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Document", id))?;

    let file_path = document.file_path.ok_or(ApiError::FileNotFound)?;
    let absolute = state.storage().absolute(&file_path);
    if !absolute.exists() {
        return Err(ApiError::FileNotFound);
    }

    let req = axum::http::Request::builder()
        .body(axum::body::Body::empty())
        .map_err(|e| ApiError::internal(format!("Failed to build request: {e}")))?;

    let mut response = match ServeFile::new(absolute).try_call(req).await {
        Ok(res) => res.into_response(),
        Err(e) => return Err(ApiError::internal(format!("Download error: {e}"))),
    };

    let file_name = document.file_name.unwrap_or_else(|| format!("document-{id}"));
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', ""));
    if let Ok(value) = header::HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(mime_type) = document.mime_type
        && let Ok(value) = header::HeaderValue::from_str(&mime_type)
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }

    Ok(response)
}
