//! Filesystem-backed object store served under `/storage`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::application::storage::{ObjectStore, StorageError, StoredObject};
use crate::domain::slug::derive_slug;
use crate::domain::types::MediaFolder;

pub const PUBLIC_PREFIX: &str = "/storage";

/// One bucket on disk; folders are the first path segment.
#[derive(Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Open the bucket at `root`, creating every folder if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        for folder in MediaFolder::ALL {
            std::fs::create_dir_all(root.join(folder.as_str()))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(StorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }

    fn describe(&self, path: String, size_bytes: u64, modified_at: Option<OffsetDateTime>) -> StoredObject {
        let file_name = path.rsplit('/').next().unwrap_or_default();
        StoredObject {
            name: display_name(file_name).to_string(),
            content_type: mime_guess::from_path(file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            public_url: self.public_url(&path),
            path,
            size_bytes,
            checksum: None,
            modified_at,
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list(&self, folder: MediaFolder) -> Result<Vec<StoredObject>, StorageError> {
        let directory = self.root.join(folder.as_str());
        let mut entries = match fs::read_dir(&directory).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let modified_at = metadata.modified().ok().map(OffsetDateTime::from);
            objects.push(self.describe(
                format!("{}/{file_name}", folder.as_str()),
                metadata.len(),
                modified_at,
            ));
        }

        objects.sort_by(|a, b| b.modified_at.cmp(&a.modified_at).then(a.path.cmp(&b.path)));
        Ok(objects)
    }

    async fn upload(
        &self,
        folder: MediaFolder,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredObject, StorageError> {
        if data.is_empty() {
            return Err(StorageError::EmptyPayload);
        }

        let stored_path = format!(
            "{}/{}-{}",
            folder.as_str(),
            Uuid::new_v4(),
            sanitize_filename(filename)
        );
        let absolute = self.resolve(&stored_path)?;

        let mut file = fs::File::create(&absolute).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        let mut hasher = Sha256::new();
        hasher.update(&data);

        let mut object = self.describe(
            stored_path,
            data.len() as u64,
            Some(OffsetDateTime::now_utc()),
        );
        object.content_type = content_type.to_string();
        object.checksum = Some(hex::encode(hasher.finalize()));
        Ok(object)
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        let absolute = self.resolve(path)?;
        match fs::remove_file(&absolute).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    async fn read(&self, path: &str) -> Result<Bytes, StorageError> {
        let absolute = self.resolve(path)?;
        match fs::read(absolute).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{PUBLIC_PREFIX}/{path}")
    }
}

/// Stored names are `{uuid}-{name}`; show only `{name}`.
fn display_name(file_name: &str) -> &str {
    match file_name.split_at_checked(36) {
        Some((prefix, rest)) if Uuid::parse_str(prefix).is_ok() => {
            rest.strip_prefix('-').unwrap_or(rest)
        }
        _ => file_name,
    }
}

fn sanitize_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = derive_slug(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty() && value.chars().all(|ch| ch.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}
