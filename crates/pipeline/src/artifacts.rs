//! Where uploaded artifacts live.
//!
//! Artifacts are keyed by run id under a configured bucket and prefix, so
//! every upload for run `r1` lands under `{prefix}/r1/`. For the local
//! scheme the "bucket" is unused and the prefix is an absolute path.

use std::path::Path;

use basin_store::{Scheme, StorageUri};

/// The configured destination root for uploaded artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactLocation {
    pub scheme: Scheme,
    /// Unused for the local scheme.
    pub bucket: String,
    /// Key prefix, or an absolute directory for the local scheme.
    pub prefix: String,
}

impl ArtifactLocation {
    pub fn s3(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::S3,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    pub fn local(root: &Path) -> Self {
        Self {
            scheme: Scheme::File,
            bucket: String::new(),
            prefix: root.to_string_lossy().into_owned(),
        }
    }

    /// Destination URI for one artifact of one run.
    pub fn uri_for(&self, run_id: &str, file_name: &str) -> StorageUri {
        let key = format!("{}/{run_id}/{file_name}", self.prefix.trim_end_matches('/'));
        match self.scheme {
            Scheme::S3 => StorageUri::for_s3(self.bucket.clone(), key),
            Scheme::File => StorageUri {
                scheme: Scheme::File,
                bucket: String::new(),
                key,
            },
        }
    }
}
