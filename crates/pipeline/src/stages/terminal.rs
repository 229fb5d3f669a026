//! Exit and Fail, the two terminal stages.
//!
//! Exit assembles the final run document, writes the run-summary artifact
//! under the writing sentinel, persists through the registry, and then
//! notifies every configured target. Fail persists the failed status and
//! notifies the failure endpoints; it never raises, so the pipeline always
//! reaches a persisted terminal state.

use basin_core::run::{AccessoryArtifact, ModelRun, RunStatus};
use basin_core::{sentinel, workspace};
use basin_events::{notify_all, RunNotifier};

use crate::capabilities::RunRegistry;
use crate::context::StageContext;
use crate::stages::Stage;
use crate::StageError;

/// Mark the run successful and publish its artifacts.
pub async fn exit(
    ctx: &StageContext<'_>,
    registry: &dyn RunRegistry,
    notifiers: &[Box<dyn RunNotifier>],
    data_paths: Vec<String>,
    pre_gen_output_paths: Vec<AccessoryArtifact>,
) -> Result<(), StageError> {
    let run_id = ctx.run_id();
    let mut run = load_run(ctx, registry).await?;

    run.status = RunStatus::Success;
    run.data_paths = data_paths;
    run.pre_gen_output_paths = pre_gen_output_paths;
    run.executed_at = Some(chrono::Utc::now());

    // The summary is what status polling inspects, so it is bracketed by
    // the writing marker: created before the first byte, removed only once
    // the write fully completed.
    let summary_path = ctx.workspace.summary_path(run_id);
    let guard = sentinel::begin_write(&summary_path)?;
    let bytes = serde_json::to_vec_pretty(&run).map_err(|e| StageError::Registry(e.to_string()))?;
    std::fs::write(&summary_path, bytes)?;
    workspace::set_permissive(&summary_path)?;
    guard.commit()?;

    registry.put(&run).await?;
    ctx.log(Stage::Exit, "run completed")?;

    notify_all(notifiers, &run, true).await;
    Ok(())
}

/// Mark the run failed. Never returns an error: failures while failing are
/// logged and swallowed.
pub async fn fail(
    ctx: &StageContext<'_>,
    registry: &dyn RunRegistry,
    notifiers: &[Box<dyn RunNotifier>],
    error: &StageError,
) {
    let run_id = ctx.run_id();
    tracing::error!(run_id, error = %error, "run failed");

    if let Err(e) = ctx.log(Stage::Fail, &error.to_string()) {
        tracing::warn!(run_id, error = %e, "could not write failure log");
    }

    let mut run = match load_run(ctx, registry).await {
        Ok(run) => run,
        Err(e) => {
            tracing::error!(run_id, error = %e, "could not load run while failing");
            return;
        }
    };

    // A run that already settled keeps its recorded outcome; this happens
    // when a superseded job finishes after its replacement did.
    if run.status.is_terminal() {
        tracing::warn!(
            run_id,
            status = run.status.as_str(),
            "run already settled, leaving its outcome in place"
        );
        return;
    }

    run.status = RunStatus::Failed;
    run.executed_at = Some(chrono::Utc::now());
    if let Err(e) = registry.put(&run).await {
        tracing::error!(run_id, error = %e, "could not persist failed status");
    }

    notify_all(notifiers, &run, false).await;
}

async fn load_run(
    ctx: &StageContext<'_>,
    registry: &dyn RunRegistry,
) -> Result<ModelRun, StageError> {
    registry
        .get(ctx.run_id())
        .await?
        .ok_or_else(|| StageError::Registry(format!("run {} not registered", ctx.run_id())))
}
