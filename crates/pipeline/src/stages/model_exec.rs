//! ModelExec: run the model container.
//!
//! Drives the injected [`ContainerRuntime`] with the model image, the
//! substituted directive command, and the planned mounts. The container's
//! combined output is appended to the stage log; a launch failure, timeout,
//! or non-zero exit routes the run to Fail.

use std::time::Duration;

use basin_runtime::{ContainerRuntime, ExecutionSpec};

use crate::context::StageContext;
use crate::stages::Stage;
use crate::StageError;

pub async fn run(
    ctx: &StageContext<'_>,
    runtime: &dyn ContainerRuntime,
    timeout: Option<Duration>,
) -> Result<(), StageError> {
    let payload = ctx.payload;
    let spec = ExecutionSpec {
        image: payload.model.image.clone(),
        command: payload.command.clone(),
        workdir: payload.workdir.clone(),
        mounts: payload.plan.mounts.clone(),
        name: format!("run_{}", payload.run_id),
        timeout,
    };

    ctx.log(
        Stage::ModelExec,
        &format!("launching {} as {}", spec.image, spec.name),
    )?;

    let output = runtime
        .execute(&spec)
        .await
        .map_err(|e| StageError::ContainerExecution(e.to_string()))?;

    if !output.logs.is_empty() {
        ctx.log(Stage::ModelExec, output.logs.trim_end())?;
    }

    if !output.succeeded() {
        return Err(StageError::ContainerExecution(format!(
            "container {} exited with code {}",
            spec.name, output.exit_code
        )));
    }

    ctx.log(Stage::ModelExec, "container exited successfully")?;
    Ok(())
}
