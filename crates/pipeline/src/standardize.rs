//! Containerized [`Standardize`] implementation.
//!
//! The standardizer is its own image. Each invocation mounts the run's
//! results directory at the data mount and its mapper directory at the
//! mapper mount, runs the standardizer over one input, and reads the
//! outcome the container prints as its final stdout line: a JSON object
//! with shard file names (relative to the data mount) and the column
//! rename map.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use basin_core::mounts::{StandardizeInput, STANDARDIZE_DATA_MOUNT, STANDARDIZE_MAPPER_MOUNT};
use basin_core::workspace::{RunWorkspace, SHARD_SUFFIX};
use basin_runtime::{ContainerRuntime, ExecutionSpec, Mount};

use crate::capabilities::{Standardize, StandardizeOutcome};
use crate::StageError;

/// Outcome line printed by the standardizer container.
#[derive(Debug, Deserialize)]
struct WireOutcome {
    /// Shard file names relative to the data mount.
    shards: Vec<String>,
    #[serde(default)]
    rename_map: BTreeMap<String, String>,
}

/// Runs the standardizer image once per input through the container
/// runtime.
pub struct ContainerStandardize {
    runtime: Arc<dyn ContainerRuntime>,
    image: String,
    workspace: RunWorkspace,
    timeout: Option<Duration>,
}

impl ContainerStandardize {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        image: impl Into<String>,
        workspace: RunWorkspace,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            runtime,
            image: image.into(),
            workspace,
            timeout,
        }
    }

    fn command(input: &StandardizeInput, admin_level: Option<&str>) -> String {
        let mut command = format!(
            "standardize --input {} --mapper {} --output-dir {STANDARDIZE_DATA_MOUNT}",
            input.input_file, input.mapper
        );
        if let Some(level) = admin_level {
            command.push_str(&format!(" --admin-level {level}"));
        }
        command
    }

    fn parse_outcome(run_id: &str, logs: &str, workspace: &RunWorkspace) -> Result<StandardizeOutcome, StageError> {
        let last_line = logs
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| StageError::Transform("standardizer produced no output".to_string()))?;

        let wire: WireOutcome = serde_json::from_str(last_line.trim()).map_err(|e| {
            StageError::Transform(format!("unreadable standardizer outcome: {e}"))
        })?;

        if let Some(name) = wire.shards.iter().find(|n| !n.ends_with(SHARD_SUFFIX)) {
            return Err(StageError::Transform(format!(
                "standardizer reported a non-shard file: {name}"
            )));
        }

        let run_dir = workspace.run_dir(run_id);
        Ok(StandardizeOutcome {
            shards: wire.shards.iter().map(|name| run_dir.join(name)).collect(),
            rename_map: wire.rename_map,
        })
    }
}

#[async_trait]
impl Standardize for ContainerStandardize {
    async fn standardize(
        &self,
        run_id: &str,
        input: &StandardizeInput,
        admin_level: Option<&str>,
    ) -> Result<StandardizeOutcome, StageError> {
        let spec = ExecutionSpec {
            image: self.image.clone(),
            command: Self::command(input, admin_level),
            workdir: None,
            mounts: vec![
                Mount::new(self.workspace.run_dir(run_id), STANDARDIZE_DATA_MOUNT),
                Mount::new(self.workspace.mappers_dir(run_id), STANDARDIZE_MAPPER_MOUNT),
            ],
            name: format!("standardize_{run_id}_{}", uuid::Uuid::new_v4().simple()),
            timeout: self.timeout,
        };

        let output = self
            .runtime
            .execute(&spec)
            .await
            .map_err(|e| StageError::Transform(e.to_string()))?;

        if !output.succeeded() {
            return Err(StageError::Transform(format!(
                "standardizer exited with code {} for {}",
                output.exit_code, input.input_file
            )));
        }

        Self::parse_outcome(run_id, &output.logs, &self.workspace)
    }
}
