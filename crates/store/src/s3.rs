//! S3 backend for `s3://` URIs.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

use crate::{ObjectStore, Scheme, StorageUri, StoreError};

/// Reads and writes objects in S3.
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    /// Build a client from the ambient AWS configuration (environment,
    /// profile, instance metadata).
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
        }
    }

    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    fn check_scheme(uri: &StorageUri) -> Result<(), StoreError> {
        if uri.scheme != Scheme::S3 {
            return Err(StoreError::UnsupportedScheme(uri.scheme.as_str().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, uri: &StorageUri, bytes: Vec<u8>) -> Result<(), StoreError> {
        Self::check_scheme(uri)?;
        self.client
            .put_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, uri: &StorageUri) -> Result<Vec<u8>, StoreError> {
        Self::check_scheme(uri)?;
        let response = self
            .client
            .get_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;
        Ok(bytes.into_bytes().to_vec())
    }

    /// Objects under the results prefix are public per the bucket policy,
    /// so the virtual-hosted URL is directly fetchable.
    fn public_url(&self, uri: &StorageUri) -> String {
        format!("https://{}.s3.amazonaws.com/{}", uri.bucket, uri.key)
    }
}
