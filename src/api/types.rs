use serde::Serialize;

use crate::db::User;
use crate::entities::{accreditation_stats, documents, indicators};
use crate::services::DocumentStorage;

#[derive(Debug, Serialize)]
pub struct StatusOk {
    pub status: &'static str,
}

impl StatusOk {
    #[must_use]
    pub const fn new() -> Self {
        Self { status: "ok" }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub city: Option<String>,
    pub institution: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            phone: user.phone,
            role: user.role,
            city: user.city,
            institution: user.institution,
            photo_url: user.photo_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct IndicatorDto {
    pub id: i32,
    pub name: String,
    pub region: Option<String>,
    pub capaian: Option<f64>,
    pub target: Option<f64>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<indicators::Model> for IndicatorDto {
    fn from(model: indicators::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            region: model.region,
            capaian: model.capaian,
            target: model.target,
            status: model.status,
            date: model.date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Latest accreditation figures. `id` is absent when no row matched the
/// filters and the zeros placeholder is returned.
#[derive(Debug, Serialize)]
pub struct AccreditationDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub paripurna: i32,
    pub utama: i32,
    pub madya: i32,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub region: Option<String>,
    pub recorded_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl AccreditationDto {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            id: None,
            paripurna: 0,
            utama: 0,
            madya: 0,
            year: None,
            month: None,
            region: None,
            recorded_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<accreditation_stats::Model> for AccreditationDto {
    fn from(model: accreditation_stats::Model) -> Self {
        Self {
            id: Some(model.id),
            paripurna: model.paripurna,
            utama: model.utama,
            madya: model.madya,
            year: model.year,
            month: model.month,
            region: model.region,
            recorded_at: model.recorded_at,
            created_at: Some(model.created_at),
            updated_at: Some(model.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentDto {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub file_url: Option<String>,
    pub download_url: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<documents::Model> for DocumentDto {
    fn from(model: documents::Model) -> Self {
        let file_url = model.file_path.as_deref().map(DocumentStorage::public_url);
        let download_url = model
            .file_path
            .is_some()
            .then(|| format!("/documents/{}/download", model.id));

        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            category: model.category,
            file_url,
            download_url,
            file_name: model.file_name,
            mime_type: model.mime_type,
            file_size: model.file_size,
            published_at: model.published_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogActorDto {
    pub id: i32,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityLogDto {
    pub id: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
    pub user: Option<LogActorDto>,
}
