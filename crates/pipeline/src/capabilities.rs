//! Capability traits the pipeline depends on but does not implement.
//!
//! [`RunRegistry`] abstracts run-document persistence
//! ([`PgRegistry`](crate::registry::PgRegistry) in production) and
//! [`Standardize`] abstracts the tabular standardization step
//! ([`ContainerStandardize`](crate::standardize::ContainerStandardize) in
//! production). Integration tests inject in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use basin_core::mounts::StandardizeInput;
use basin_core::run::ModelRun;

use crate::StageError;

/// Persistence seam for run documents.
#[async_trait]
pub trait RunRegistry: Send + Sync {
    async fn get(&self, run_id: &str) -> Result<Option<ModelRun>, StageError>;
    async fn put(&self, run: &ModelRun) -> Result<(), StageError>;
}

/// What one standardize invocation produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardizeOutcome {
    /// Host paths of the tabular shards written into the run directory.
    pub shards: Vec<PathBuf>,
    /// Synonymous-column renames discovered while standardizing.
    #[serde(default)]
    pub rename_map: BTreeMap<String, String>,
}

/// Opaque standardization seam: raw model output plus its mapper in,
/// tabular shards plus a column rename map out.
#[async_trait]
pub trait Standardize: Send + Sync {
    async fn standardize(
        &self,
        run_id: &str,
        input: &StandardizeInput,
        admin_level: Option<&str>,
    ) -> Result<StandardizeOutcome, StageError>;
}
