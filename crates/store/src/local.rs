//! Local-filesystem backend for `file://` URIs.

use async_trait::async_trait;
use std::path::Path;

use crate::{ObjectStore, Scheme, StorageUri, StoreError};

/// Reads and writes objects directly on the local filesystem.
#[derive(Debug, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }

    fn path_of(uri: &StorageUri) -> Result<&Path, StoreError> {
        if uri.scheme != Scheme::File {
            return Err(StoreError::UnsupportedScheme(uri.scheme.as_str().to_string()));
        }
        Ok(Path::new(&uri.key))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, uri: &StorageUri, bytes: Vec<u8>) -> Result<(), StoreError> {
        let path = Self::path_of(uri)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn get(&self, uri: &StorageUri) -> Result<Vec<u8>, StoreError> {
        let path = Self::path_of(uri)?;
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(uri.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, uri: &StorageUri) -> String {
        uri.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/dir/object.bin");
        let uri = StorageUri::for_local_path(&path);

        LocalStore::new().put(&uri, b"abc".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn get_missing_object_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let uri = StorageUri::for_local_path(&tmp.path().join("missing"));
        let err = LocalStore::new().get(&uri).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
