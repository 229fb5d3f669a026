//! Storage URI parsing.
//!
//! URIs take the form `scheme://bucket/key`. For `file://` URIs the bucket
//! is empty and the key is the absolute path (`file:///srv/x` has key
//! `/srv/x`).

use std::fmt;
use std::path::Path;

use crate::StoreError;

/// Supported storage schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    S3,
    File,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::S3 => "s3",
            Scheme::File => "file",
        }
    }
}

/// A parsed storage location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUri {
    pub scheme: Scheme,
    /// Empty for `file://` URIs.
    pub bucket: String,
    pub key: String,
}

impl StorageUri {
    /// Parse a `scheme://bucket/key` or `file:///path` string.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let (scheme_str, rest) = raw
            .split_once("://")
            .ok_or_else(|| StoreError::InvalidUri(raw.to_string()))?;

        match scheme_str {
            "s3" => {
                let (bucket, key) = rest
                    .split_once('/')
                    .ok_or_else(|| StoreError::InvalidUri(raw.to_string()))?;
                if bucket.is_empty() || key.is_empty() {
                    return Err(StoreError::InvalidUri(raw.to_string()));
                }
                Ok(Self {
                    scheme: Scheme::S3,
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            "file" => {
                if !rest.starts_with('/') {
                    return Err(StoreError::InvalidUri(raw.to_string()));
                }
                Ok(Self {
                    scheme: Scheme::File,
                    bucket: String::new(),
                    key: rest.to_string(),
                })
            }
            other => Err(StoreError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Build an `s3://` URI from bucket and key.
    pub fn for_s3(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::S3,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Build a `file://` URI from a local path.
    pub fn for_local_path(path: &Path) -> Self {
        Self {
            scheme: Scheme::File,
            bucket: String::new(),
            key: path.to_string_lossy().into_owned(),
        }
    }
}

impl fmt::Display for StorageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scheme {
            Scheme::S3 => write!(f, "s3://{}/{}", self.bucket, self.key),
            Scheme::File => write!(f, "file://{}", self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_s3_uri() {
        let uri = StorageUri::parse("s3://results/dmc/r1/file.parquet.gzip").unwrap();
        assert_eq!(uri.scheme, Scheme::S3);
        assert_eq!(uri.bucket, "results");
        assert_eq!(uri.key, "dmc/r1/file.parquet.gzip");
    }

    #[test]
    fn parses_file_uri_with_absolute_key() {
        let uri = StorageUri::parse("file:///srv/basin/results/r1/out.json").unwrap();
        assert_eq!(uri.scheme, Scheme::File);
        assert_eq!(uri.bucket, "");
        assert_eq!(uri.key, "/srv/basin/results/r1/out.json");
    }

    #[test]
    fn display_round_trips() {
        for raw in ["s3://bucket/a/b.csv", "file:///tmp/x"] {
            assert_eq!(StorageUri::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn rejects_malformed_uris() {
        assert!(StorageUri::parse("no-scheme/path").is_err());
        assert!(StorageUri::parse("s3://bucket-only").is_err());
        assert!(StorageUri::parse("s3:///key-only").is_err());
        assert!(StorageUri::parse("file://relative/path").is_err());
        assert!(StorageUri::parse("ftp://bucket/key").is_err());
    }
}
