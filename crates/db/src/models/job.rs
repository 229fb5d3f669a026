//! Job entity models and DTOs for the run execution queue.

use basin_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    /// Logical identity of the job: pipeline name + model id + run id.
    pub job_key: String,
    pub run_id: String,
    pub model_id: String,
    pub status_id: StatusId,
    /// The serialized run-job payload the worker executes.
    pub payload: serde_json::Value,
    pub error_message: Option<String>,
    /// True once the job has been replaced by a force restart.
    pub superseded: bool,
    pub submitted_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for enqueueing a new run job.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitJob {
    pub job_key: String,
    pub run_id: String,
    pub model_id: String,
    pub payload: serde_json::Value,
}
