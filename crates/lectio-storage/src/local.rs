use crate::traits::{ContentStore, StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStore {
    /// Create a new LocalStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for blob storage (e.g., "/var/lib/lectio/media")
    /// * `base_url` - Base URL files are served under (e.g., "http://localhost:3000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StoreResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore {
            base_path,
            base_url,
        })
    }

    /// Build a LocalStore from application config. Returns `None` when the
    /// local backend is not configured.
    pub async fn from_config(config: &lectio_core::Config) -> Option<StoreResult<Self>> {
        let path = config.local_storage_path.as_ref()?;
        let url = config.local_storage_base_url.clone()?;
        Some(Self::new(path, url).await)
    }

    /// Convert a storage key to a filesystem path, rejecting keys that could
    /// escape the base directory.
    fn key_to_path(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty()
            || key.contains("..")
            || key.starts_with('/')
            || key.contains('\\')
            || key.contains('\0')
        {
            return Err(StoreError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(key))
    }

    /// Generate the public URL for a key
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for LocalStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<String> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        // create_new gives no-overwrite semantics: a colliding key fails
        // instead of silently replacing the stored blob.
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    StoreError::KeyExists(key.to_string())
                } else {
                    StoreError::UploadFailed(format!(
                        "Failed to create file {}: {}",
                        path.display(),
                        e
                    ))
                }
            })?;

        file.write_all(&data).await.map_err(|e| {
            StoreError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StoreError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let url = self.generate_url(key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage put successful"
        );

        Ok(url)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }
}
