//! Object-store capability.
//!
//! Artifacts are addressed by [`StorageUri`]s of the form
//! `s3://bucket/key` or `file:///local/path`. The [`ObjectStore`] trait is
//! the seam the pipeline depends on; [`S3Store`] and [`LocalStore`] are the
//! two backends, and [`StoreRouter`] dispatches on the URI scheme so mixed
//! deployments (S3 results, local configs) need a single injected client.

pub mod local;
pub mod s3;
pub mod uri;

use async_trait::async_trait;

pub use local::LocalStore;
pub use s3::S3Store;
pub use uri::{Scheme, StorageUri};

/// Errors raised by object-store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid storage uri: {0}")]
    InvalidUri(String),

    #[error("no backend configured for scheme \"{0}\"")]
    UnsupportedScheme(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),
}

/// Capability for reading and writing artifact bytes by URI.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` to `uri`, replacing any existing object.
    async fn put(&self, uri: &StorageUri, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Read the full object at `uri`.
    async fn get(&self, uri: &StorageUri) -> Result<Vec<u8>, StoreError>;

    /// Public URL callers may fetch the object from.
    fn public_url(&self, uri: &StorageUri) -> String;
}

/// Dispatches operations to the backend matching each URI's scheme.
pub struct StoreRouter {
    s3: Option<S3Store>,
    local: LocalStore,
}

impl StoreRouter {
    pub fn new(s3: Option<S3Store>) -> Self {
        Self {
            s3,
            local: LocalStore::new(),
        }
    }

    fn backend(&self, uri: &StorageUri) -> Result<&dyn ObjectStore, StoreError> {
        match uri.scheme {
            Scheme::File => Ok(&self.local),
            Scheme::S3 => self
                .s3
                .as_ref()
                .map(|s| s as &dyn ObjectStore)
                .ok_or_else(|| StoreError::UnsupportedScheme("s3".to_string())),
        }
    }
}

#[async_trait]
impl ObjectStore for StoreRouter {
    async fn put(&self, uri: &StorageUri, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.backend(uri)?.put(uri, bytes).await
    }

    async fn get(&self, uri: &StorageUri) -> Result<Vec<u8>, StoreError> {
        self.backend(uri)?.get(uri).await
    }

    fn public_url(&self, uri: &StorageUri) -> String {
        match self.backend(uri) {
            Ok(backend) => backend.public_url(uri),
            Err(_) => uri.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn router_without_s3_rejects_s3_uris() {
        let router = StoreRouter::new(None);
        let uri = StorageUri::parse("s3://bucket/key").unwrap();
        let err = router.get(&uri).await.unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedScheme(_)));
    }

    #[tokio::test]
    async fn router_round_trips_file_uris() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("artifact.bin");
        let uri = StorageUri::for_local_path(&path);

        let router = StoreRouter::new(None);
        router.put(&uri, b"payload".to_vec()).await.unwrap();
        assert_eq!(router.get(&uri).await.unwrap(), b"payload");
    }
}
