//! Handlers for run submission, retrieval, logs, and status polling.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use basin_core::error::CoreError;
use basin_core::run::{ModelRun, RunParameter};
use basin_core::sentinel;
use basin_db::models::job::SubmitJob;
use basin_db::models::status::JobStatus;
use basin_db::repositories::job_repo::JobRepo;
use basin_db::repositories::model_repo::ModelRepo;
use basin_db::repositories::run_repo::{RunRepo, RunSearchQuery};
use basin_pipeline::Stage;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::submission;

// ---------------------------------------------------------------------------
// POST /runs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    pub model_id: String,
    /// Caller-chosen run id; generated when absent.
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub parameters: Vec<RunParameter>,
    #[serde(default)]
    pub workdir: Option<String>,
    #[serde(default)]
    pub admin_level: Option<String>,
    /// Supersede an existing live job for this run instead of attaching
    /// to it. The in-flight container, if any, keeps running.
    #[serde(default)]
    pub force_restart: bool,
}

/// Submit a run.
///
/// Submission is idempotent per `(model, run)` job key: when a live job
/// already exists and `force_restart` is not set, the existing run is
/// returned instead of enqueueing a duplicate execution.
pub async fn create_run(
    State(state): State<AppState>,
    Json(input): Json<CreateRunRequest>,
) -> AppResult<impl IntoResponse> {
    let model = ModelRepo::find_by_id(&state.pool, &input.model_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "model",
            id: input.model_id.clone(),
        })?;

    let run_id = input
        .run_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let submission = submission::build(
        run_id,
        model,
        input.parameters,
        input.workdir,
        input.admin_level,
        &state.workspace(),
    )?;
    let job_key = submission.payload.job_key();

    if input.force_restart {
        let superseded = JobRepo::supersede_by_key(&state.pool, &job_key).await?;
        if superseded {
            tracing::info!(job_key, "superseded live job for restart");
        }
    } else if let Some(existing) = JobRepo::find_active_by_key(&state.pool, &job_key).await? {
        tracing::info!(job_key, job_id = existing.id, "attaching to existing job");
        let run = load_run(&state, &existing.run_id).await?;
        return Ok(run_response(StatusCode::OK, run));
    }

    let payload = serde_json::to_value(&submission.payload)
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    // The run document is upserted so a force restart rewrites the
    // existing row instead of tripping the primary key, and a retry after
    // a partial submission can complete it. `uq_jobs_active_key` then
    // arbitrates between concurrent identical submissions: the loser
    // attaches to the winner's job.
    RunRepo::upsert(&state.pool, &submission.run).await?;
    let job = match JobRepo::submit(
        &state.pool,
        &SubmitJob {
            job_key: job_key.clone(),
            run_id: submission.run.id.clone(),
            model_id: submission.run.model_id.clone(),
            payload,
        },
    )
    .await
    {
        Ok(job) => job,
        Err(e) if JobRepo::is_duplicate_active_key(&e) => {
            tracing::info!(job_key, "lost the submission race, attaching to existing job");
            let existing = JobRepo::find_active_by_key(&state.pool, &job_key)
                .await?
                .ok_or_else(|| CoreError::NotFound {
                    entity: "job",
                    id: job_key.clone(),
                })?;
            let run = load_run(&state, &existing.run_id).await?;
            return Ok(run_response(StatusCode::OK, run));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        run_id = %submission.run.id,
        model_id = %submission.run.model_id,
        job_id = job.id,
        "run submitted"
    );

    Ok(run_response(StatusCode::CREATED, submission.run))
}

async fn load_run(state: &AppState, run_id: &str) -> Result<ModelRun, AppError> {
    Ok(RunRepo::find_by_id(&state.pool, run_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "run",
            id: run_id.to_string(),
        })?)
}

fn run_response(
    status: StatusCode,
    run: ModelRun,
) -> (StatusCode, [(header::HeaderName, String); 1], Json<DataResponse<ModelRun>>) {
    let location = format!("/api/v1/runs/{}", run.id);
    (status, [(header::LOCATION, location)], Json(DataResponse { data: run }))
}

// ---------------------------------------------------------------------------
// GET /runs/{id}, GET /runs, PUT /runs
// ---------------------------------------------------------------------------

/// Fetch one run document.
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> AppResult<Json<DataResponse<ModelRun>>> {
    let run = RunRepo::find_by_id(&state.pool, &run_id)
        .await?
        .ok_or(CoreError::NotFound { entity: "run", id: run_id })?;
    Ok(Json(DataResponse { data: run }))
}

/// Search runs by model id or name, newest first.
pub async fn search_runs(
    State(state): State<AppState>,
    Query(query): Query<RunSearchQuery>,
) -> AppResult<Json<DataResponse<Vec<ModelRun>>>> {
    let runs = RunRepo::search(&state.pool, &query).await?;
    Ok(Json(DataResponse { data: runs }))
}

/// Replace a run document.
pub async fn update_run(
    State(state): State<AppState>,
    Json(run): Json<ModelRun>,
) -> AppResult<Json<DataResponse<ModelRun>>> {
    RunRepo::update(&state.pool, &run).await?;
    Ok(Json(DataResponse { data: run }))
}

// ---------------------------------------------------------------------------
// GET /runs/{id}/logs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StageLog {
    /// Stage log file stem, e.g. `model-exec`.
    pub stage: &'static str,
    /// Human-readable stage name, e.g. "Model run".
    pub name: &'static str,
    pub content: String,
}

/// Per-stage pipeline logs, in stage order, for stages that have logged.
pub async fn get_run_logs(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> AppResult<Json<DataResponse<Vec<StageLog>>>> {
    let workspace = state.workspace();
    let mut logs = Vec::new();

    for stage in Stage::ALL {
        let path = workspace.stage_log_path(&run_id, stage.file_stem());
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => logs.push(StageLog {
                stage: stage.file_stem(),
                name: stage.display_name(),
                content,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(AppError::InternalError(e.to_string())),
        }
    }

    Ok(Json(DataResponse { data: logs }))
}

// ---------------------------------------------------------------------------
// GET /runs/{id}/status
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RunStatusResponse {
    /// True only when the live job (if any) has settled and the run
    /// summary exists without its writing marker. A stale summary from a
    /// superseded execution never reports a restarted run done, and a
    /// partially written summary never reports done either.
    pub is_done: bool,
    pub is_failed: bool,
    pub job_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<String>,
}

/// Poll a run's completion state.
pub async fn get_run_status(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> AppResult<Json<DataResponse<RunStatusResponse>>> {
    let job = JobRepo::find_active_by_run(&state.pool, &run_id).await?;

    let (job_status, job_error) = match &job {
        Some(job) => (
            JobStatus::from_id(job.status_id)
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            job.error_message.clone(),
        ),
        None => ("unknown".to_string(), None),
    };

    let status = job.as_ref().and_then(|j| JobStatus::from_id(j.status_id));
    let is_failed = status == Some(JobStatus::Failed);
    let is_done = job_settled(status)
        && sentinel::is_complete(&state.workspace().summary_path(&run_id));

    Ok(Json(DataResponse {
        data: RunStatusResponse {
            is_done,
            is_failed,
            job_status,
            job_error,
        },
    }))
}

/// Whether the live job, if one is known, has reached a terminal status.
/// With no live job the summary artifact alone decides.
fn job_settled(status: Option<JobStatus>) -> bool {
    status.map_or(true, |s| s.is_terminal())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settling_requires_a_terminal_job_status() {
        assert!(job_settled(None));
        assert!(job_settled(Some(JobStatus::Completed)));
        assert!(job_settled(Some(JobStatus::Failed)));
        assert!(!job_settled(Some(JobStatus::Pending)));
        assert!(!job_settled(Some(JobStatus::Running)));
    }
}
