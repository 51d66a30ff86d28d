//! Storage abstraction trait
//!
//! This module defines the ContentStore trait the upload pipeline writes
//! media and companion blobs through.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Key already exists: {0}")]
    KeyExists(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable blob storage as the pipeline sees it.
///
/// Keys are unique, generated paths (see [`crate::keys`]); a `put` to an
/// already-occupied key must fail with [`StoreError::KeyExists`] rather than
/// silently replace the existing blob.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a blob under `key` and return its publicly resolvable URL.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<String>;

    /// Whether a blob is currently stored under `key`.
    async fn exists(&self, key: &str) -> StoreResult<bool>;
}
