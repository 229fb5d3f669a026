//! Container-runtime capability.
//!
//! [`ContainerRuntime`] is the seam between the pipeline and whatever
//! actually runs containers. The shipped implementation is
//! [`DockerRuntime`], which shells out to the `docker` CLI; tests inject
//! fakes.

pub mod docker;

use async_trait::async_trait;
use std::time::Duration;

pub use basin_core::mounts::Mount;
pub use docker::DockerRuntime;

/// Everything needed to launch one container execution.
#[derive(Debug, Clone)]
pub struct ExecutionSpec {
    pub image: String,
    /// Full command line, run through the container's shell.
    pub command: String,
    /// Working directory inside the container, when the image default is
    /// not appropriate.
    pub workdir: Option<String>,
    pub mounts: Vec<Mount>,
    /// Container name, e.g. `run_{run_id}`.
    pub name: String,
    /// Hard wall-clock limit; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Result of a finished container execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub exit_code: i32,
    /// Combined stdout/stderr, truncated to the output cap.
    pub logs: String,
}

impl ExecutionOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors raised while launching or waiting on a container.
///
/// A container that starts and exits non-zero is *not* an error here; the
/// caller inspects [`ExecutionOutput::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to launch container: {0}")]
    Launch(#[from] std::io::Error),

    #[error("container execution timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },
}

/// Capability for executing a model (or standardizer) container.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn execute(&self, spec: &ExecutionSpec) -> Result<ExecutionOutput, RuntimeError>;
}
