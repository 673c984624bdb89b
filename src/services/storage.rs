use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

use crate::config::StorageConfig;

/// Filesystem content store for uploaded documents. Stored paths are
/// relative to the root and served back under `/storage`.
pub struct DocumentStorage {
    root: PathBuf,
    max_upload_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl DocumentStorage {
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root_path),
            max_upload_bytes: config.max_upload_bytes,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Extension allow-list check on the client file name
    #[must_use]
    pub fn extension_allowed(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.allowed_extensions.iter().any(|a| a == &ext))
    }

    /// Write the bytes under a generated name, keeping the extension.
    /// Returns the path relative to the store root.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "bin".to_string());

        let relative = format!("documents/{}.{}", Uuid::new_v4(), extension);
        let absolute = self.root.join(&relative);

        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create document directory")?;
        }

        tokio::fs::write(&absolute, bytes)
            .await
            .with_context(|| format!("Failed to write {}", absolute.display()))?;

        Ok(relative)
    }

    #[must_use]
    pub fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Best-effort removal; a missing file is not an error
    pub async fn delete(&self, relative: &str) {
        let absolute = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&absolute).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove stored file {}: {e}", absolute.display());
        }
    }

    /// Public URL for a stored path, served by the static file route
    #[must_use]
    pub fn public_url(relative: &str) -> String {
        format!("/storage/{relative}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &Path) -> DocumentStorage {
        DocumentStorage::new(&StorageConfig {
            root_path: dir.to_string_lossy().to_string(),
            ..StorageConfig::default()
        })
    }

    #[test]
    fn extension_allow_list() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());

        assert!(storage.extension_allowed("report.pdf"));
        assert!(storage.extension_allowed("SCAN.PDF"));
        assert!(!storage.extension_allowed("payload.exe"));
        assert!(!storage.extension_allowed("no_extension"));
    }

    #[tokio::test]
    async fn save_then_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());

        let relative = storage.save("report.pdf", b"%PDF-1.4").await.unwrap();
        assert!(relative.starts_with("documents/"));
        assert!(relative.ends_with(".pdf"));
        assert!(storage.absolute(&relative).exists());

        storage.delete(&relative).await;
        assert!(!storage.absolute(&relative).exists());

        // Deleting again is a no-op
        storage.delete(&relative).await;
    }
}
