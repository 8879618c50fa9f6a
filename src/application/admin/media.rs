use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::application::admin::AdminError;
use crate::application::storage::{ObjectStore, StorageError, StoredObject, is_accepted_content_type};
use crate::domain::types::MediaFolder;

#[derive(Clone)]
pub struct AdminMediaService {
    store: Arc<dyn ObjectStore>,
    max_bytes: u64,
}

impl AdminMediaService {
    pub fn new(store: Arc<dyn ObjectStore>, max_bytes: u64) -> Self {
        Self { store, max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub async fn list(&self, folder: MediaFolder) -> Result<Vec<StoredObject>, AdminError> {
        self.store.list(folder).await.map_err(AdminError::from)
    }

    pub async fn upload(
        &self,
        folder: MediaFolder,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredObject, AdminError> {
        if data.is_empty() {
            return Err(StorageError::EmptyPayload.into());
        }
        if data.len() as u64 > self.max_bytes {
            return Err(StorageError::TooLarge {
                limit: self.max_bytes,
            }
            .into());
        }
        if !is_accepted_content_type(content_type) {
            return Err(StorageError::UnsupportedType {
                content_type: content_type.to_string(),
            }
            .into());
        }

        let object = self
            .store
            .upload(folder, filename, content_type, data)
            .await?;
        info!(
            target = "tsunagu::application::admin::media",
            path = %object.path,
            size = object.size_bytes,
            content_type = %object.content_type,
            "stored media object"
        );
        Ok(object)
    }

    pub async fn remove(&self, path: &str) -> Result<(), AdminError> {
        self.store.remove(path).await?;
        info!(
            target = "tsunagu::application::admin::media",
            path = %path,
            "removed media object"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        uploads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn list(&self, _folder: MediaFolder) -> Result<Vec<StoredObject>, StorageError> {
            unreachable!("not used in these tests")
        }

        async fn upload(
            &self,
            folder: MediaFolder,
            filename: &str,
            content_type: &str,
            data: Bytes,
        ) -> Result<StoredObject, StorageError> {
            let path = format!("{}/{filename}", folder.as_str());
            self.uploads.lock().unwrap().push(path.clone());
            Ok(StoredObject {
                public_url: self.public_url(&path),
                path,
                name: filename.to_string(),
                content_type: content_type.to_string(),
                size_bytes: data.len() as u64,
                checksum: None,
                modified_at: None,
            })
        }

        async fn remove(&self, _path: &str) -> Result<(), StorageError> {
            Ok(())
        }

        async fn read(&self, _path: &str) -> Result<Bytes, StorageError> {
            unreachable!("not used in these tests")
        }

        fn public_url(&self, path: &str) -> String {
            format!("/storage/{path}")
        }
    }

    #[tokio::test]
    async fn rejects_unsupported_types_before_storing() {
        let store = Arc::new(RecordingStore::default());
        let service = AdminMediaService::new(store.clone(), 1024);

        let result = service
            .upload(
                MediaFolder::Documents,
                "notes.txt",
                "text/plain",
                Bytes::from_static(b"hello"),
            )
            .await;

        assert!(matches!(
            result,
            Err(AdminError::Storage(StorageError::UnsupportedType { .. }))
        ));
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_oversized_and_empty_payloads() {
        let service = AdminMediaService::new(Arc::new(RecordingStore::default()), 4);

        let too_large = service
            .upload(
                MediaFolder::News,
                "a.png",
                "image/png",
                Bytes::from_static(b"12345"),
            )
            .await;
        assert!(matches!(
            too_large,
            Err(AdminError::Storage(StorageError::TooLarge { limit: 4 }))
        ));

        let empty = service
            .upload(MediaFolder::News, "a.png", "image/png", Bytes::new())
            .await;
        assert!(matches!(
            empty,
            Err(AdminError::Storage(StorageError::EmptyPayload))
        ));
    }

    #[tokio::test]
    async fn stores_accepted_images() {
        let store = Arc::new(RecordingStore::default());
        let service = AdminMediaService::new(store.clone(), 1024);

        let object = service
            .upload(
                MediaFolder::Organizations,
                "logo.png",
                "image/png",
                Bytes::from_static(b"png"),
            )
            .await
            .expect("upload");

        assert_eq!(object.public_url, "/storage/organizations/logo.png");
        assert_eq!(store.uploads.lock().unwrap().len(), 1);
    }
}
