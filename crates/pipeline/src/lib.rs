//! The run-execution pipeline.
//!
//! A claimed job is driven through a fixed sequence of stages:
//!
//! ```text
//! Rehydrate -> ModelExec -> MapperFetch -> Transform
//!           -> AccessoryUpload -> ResultUpload -> { Exit | Fail }
//! ```
//!
//! Stages are strictly ordered and any stage error routes the run to Fail,
//! the single failure absorber. Fail itself never raises, so every claimed
//! job ends with a persisted terminal run status.
//!
//! All external effects go through injected capability traits
//! ([`ContainerRuntime`](basin_runtime::ContainerRuntime),
//! [`ObjectStore`](basin_store::ObjectStore), [`Standardize`],
//! [`RunRegistry`], [`RunNotifier`](basin_events::RunNotifier)); the
//! pipeline holds no global or lazily initialized client state.

pub mod artifacts;
pub mod capabilities;
pub mod context;
pub mod executor;
pub mod payload;
pub mod registry;
pub mod stages;
pub mod standardize;

pub use artifacts::ArtifactLocation;
pub use capabilities::{RunRegistry, Standardize, StandardizeOutcome};
pub use executor::{PipelineExecutor, PipelineOutcome};
pub use payload::{job_key, RunJobPayload};
pub use registry::PgRegistry;
pub use stages::Stage;
pub use standardize::ContainerStandardize;

use basin_core::template::TemplateError;
use basin_store::StoreError;

/// Errors that route a run to the Fail stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// A template span could not be resolved against the run's parameters.
    #[error("parameter resolution failed: {0}")]
    ParameterResolution(#[from] TemplateError),

    /// The model container failed to launch, timed out, or exited non-zero.
    #[error("container execution failed: {0}")]
    ContainerExecution(String),

    /// The standardize capability rejected an input or produced no usable
    /// outcome.
    #[error("transform failed: {0}")]
    Transform(String),

    /// An artifact upload failed.
    #[error("upload failed: {0}")]
    Upload(#[from] StoreError),

    /// The run registry could not be read or written.
    #[error("registry error: {0}")]
    Registry(String),

    /// Workspace filesystem error (config write, mapper write, log append).
    #[error("workspace I/O error: {0}")]
    Io(#[from] std::io::Error),
}
