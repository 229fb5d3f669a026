//! Drives one claimed job through the stage sequence.

use std::sync::Arc;
use std::time::Duration;

use basin_core::run::RunStatus;
use basin_core::workspace::RunWorkspace;
use basin_events::RunNotifier;
use basin_runtime::ContainerRuntime;
use basin_store::ObjectStore;

use crate::artifacts::ArtifactLocation;
use crate::capabilities::{RunRegistry, Standardize};
use crate::context::StageContext;
use crate::payload::RunJobPayload;
use crate::stages;
use crate::StageError;

/// How one pipeline execution ended.
///
/// Execution never returns an error: any stage failure is absorbed by the
/// Fail stage and reported here so the worker can settle the job row.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub status: RunStatus,
    pub error: Option<String>,
}

impl PipelineOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Executes run jobs with a fixed set of injected capabilities.
pub struct PipelineExecutor {
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<dyn ObjectStore>,
    standardize: Arc<dyn Standardize>,
    registry: Arc<dyn RunRegistry>,
    notifiers: Arc<Vec<Box<dyn RunNotifier>>>,
    workspace: RunWorkspace,
    artifacts: ArtifactLocation,
    /// Wall-clock limit for the model container.
    exec_timeout: Option<Duration>,
}

impl PipelineExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<dyn ObjectStore>,
        standardize: Arc<dyn Standardize>,
        registry: Arc<dyn RunRegistry>,
        notifiers: Arc<Vec<Box<dyn RunNotifier>>>,
        workspace: RunWorkspace,
        artifacts: ArtifactLocation,
        exec_timeout: Option<Duration>,
    ) -> Self {
        Self {
            runtime,
            store,
            standardize,
            registry,
            notifiers,
            workspace,
            artifacts,
            exec_timeout,
        }
    }

    /// Run the full stage sequence for one job.
    pub async fn execute(&self, payload: &RunJobPayload) -> PipelineOutcome {
        let ctx = StageContext {
            payload,
            workspace: &self.workspace,
        };
        tracing::info!(run_id = ctx.run_id(), model_id = %payload.model.id, "pipeline started");

        match self.run_stages(&ctx).await {
            Ok(()) => {
                tracing::info!(run_id = ctx.run_id(), "pipeline finished");
                PipelineOutcome {
                    status: RunStatus::Success,
                    error: None,
                }
            }
            Err(error) => {
                stages::terminal::fail(&ctx, self.registry.as_ref(), &self.notifiers, &error).await;
                PipelineOutcome {
                    status: RunStatus::Failed,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    async fn run_stages(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        stages::rehydrate::run(ctx).await?;
        stages::model_exec::run(ctx, self.runtime.as_ref(), self.exec_timeout).await?;
        stages::mapper_fetch::run(ctx).await?;
        let transformed = stages::transform::run(ctx, self.standardize.as_ref()).await?;
        let pre_gen_output_paths =
            stages::accessory_upload::run(ctx, self.store.as_ref(), &self.artifacts).await?;
        let data_paths = stages::result_upload::run(
            ctx,
            self.store.as_ref(),
            &self.artifacts,
            &transformed.shards,
        )
        .await?;
        stages::terminal::exit(
            ctx,
            self.registry.as_ref(),
            &self.notifiers,
            data_paths,
            pre_gen_output_paths,
        )
        .await
    }
}
