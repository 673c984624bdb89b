use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
};

use crate::entities::{documents, prelude::*};

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub file_path: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub created_by: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<String>>,
    /// Replacement file metadata, set together when a new binary was stored
    pub file: Option<StoredFile>,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_path: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
}

pub struct DocumentRepository {
    conn: DatabaseConnection,
}

impl DocumentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<documents::Model>> {
        let rows = Documents::find()
            .order_by_desc(documents::Column::PublishedAt)
            .order_by_desc(documents::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list documents")?;

        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<Option<documents::Model>> {
        let row = Documents::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query document")?;

        Ok(row)
    }

    pub async fn create(&self, data: NewDocument) -> Result<documents::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = documents::ActiveModel {
            title: Set(data.title),
            description: Set(data.description),
            category: Set(data.category),
            file_path: Set(Some(data.file_path)),
            file_name: Set(Some(data.file_name)),
            mime_type: Set(Some(data.mime_type)),
            file_size: Set(Some(data.file_size)),
            published_at: Set(Some(now.clone())),
            created_by: Set(data.created_by),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert document")?;

        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        update: DocumentUpdate,
    ) -> Result<Option<documents::Model>> {
        let Some(row) = self.get(id).await? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();
        let had_published_at = row.published_at.is_some();

        let mut active: documents::ActiveModel = row.into();
        if let Some(title) = update.title {
            active.title = Set(title);
        }
        if let Some(description) = update.description {
            active.description = Set(description);
        }
        if let Some(category) = update.category {
            active.category = Set(category);
        }
        if let Some(file) = update.file {
            active.file_path = Set(Some(file.file_path));
            active.file_name = Set(Some(file.file_name));
            active.mime_type = Set(Some(file.mime_type));
            active.file_size = Set(Some(file.file_size));
        }
        if !had_published_at {
            active.published_at = Set(Some(now.clone()));
        }
        active.updated_at = Set(now);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update document")?;

        Ok(Some(model))
    }

    /// Returns the deleted row so the caller can clean up the stored binary
    pub async fn delete(&self, id: i32) -> Result<Option<documents::Model>> {
        let Some(row) = self.get(id).await? else {
            return Ok(None);
        };

        Documents::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete document")?;

        Ok(Some(row))
    }
}
