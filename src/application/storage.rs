//! Object-store boundary for media referenced by URL from content rows.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::types::MediaFolder;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error("content type `{content_type}` is not accepted")]
    UnsupportedType { content_type: String },
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("uploaded file exceeds {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("object not found")]
    NotFound,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredObject {
    /// Bucket-relative path, e.g. `news/3f2c…-poster.png`.
    pub path: String,
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub checksum: Option<String>,
    pub public_url: String,
    pub modified_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list(&self, folder: MediaFolder) -> Result<Vec<StoredObject>, StorageError>;

    async fn upload(
        &self,
        folder: MediaFolder,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredObject, StorageError>;

    /// Removing a missing object succeeds.
    async fn remove(&self, path: &str) -> Result<(), StorageError>;

    async fn read(&self, path: &str) -> Result<Bytes, StorageError>;

    fn public_url(&self, path: &str) -> String;
}

/// Images and PDFs only.
pub fn is_accepted_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    matches!(
        essence.as_str(),
        "image/jpeg" | "image/png" | "image/gif" | "image/webp" | "image/svg+xml" | "application/pdf"
    )
}
