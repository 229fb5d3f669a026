//! Repository for the `jobs` table.
//!
//! Uses `JobStatus` from `models::status` for all status transitions.
//! The unique partial index on `(job_key) WHERE NOT superseded` is what
//! makes submission idempotent: at most one live row per logical job.

use basin_core::types::DbId;
use sqlx::PgPool;

use crate::models::job::{Job, SubmitJob};
use crate::models::status::JobStatus;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, job_key, run_id, model_id, status_id, payload, error_message, \
    superseded, submitted_at, claimed_at, completed_at, created_at, updated_at";

/// Provides CRUD operations for run-execution jobs.
pub struct JobRepo;

impl JobRepo {
    /// Create a new pending job. Returns immediately with the job row.
    pub async fn submit(pool: &PgPool, input: &SubmitJob) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (job_key, run_id, model_id, status_id, payload) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(&input.job_key)
            .bind(&input.run_id)
            .bind(&input.model_id)
            .bind(JobStatus::Pending.id())
            .bind(&input.payload)
            .fetch_one(pool)
            .await
    }

    /// Whether an error is `uq_jobs_active_key` rejecting a second live
    /// row for the same key. Callers treat this as "someone else already
    /// submitted this job" rather than a failure.
    pub fn is_duplicate_active_key(e: &sqlx::Error) -> bool {
        matches!(
            e,
            sqlx::Error::Database(db)
                if db.code().as_deref() == Some("23505")
                    && db.constraint() == Some("uq_jobs_active_key")
        )
    }

    /// Find the live (non-superseded) job for a logical key, if any.
    pub async fn find_active_by_key(
        pool: &PgPool,
        job_key: &str,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs WHERE job_key = $1 AND NOT superseded"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_key)
            .fetch_optional(pool)
            .await
    }

    /// Find the live job for a run id, if any.
    pub async fn find_active_by_run(
        pool: &PgPool,
        run_id: &str,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE run_id = $1 AND NOT superseded \
             ORDER BY submitted_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(run_id)
            .fetch_optional(pool)
            .await
    }

    /// Mark the live job for a key as superseded so a fresh submission can
    /// take its place. Returns `true` if a row was superseded.
    ///
    /// This discards the job mapping only; an in-flight container keeps
    /// running and may still write artifacts afterwards.
    pub async fn supersede_by_key(pool: &PgPool, job_key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs SET superseded = TRUE, updated_at = NOW() \
             WHERE job_key = $1 AND NOT superseded",
        )
        .bind(job_key)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically claim the next unclaimed pending job.
    ///
    /// Uses `SELECT ... FOR UPDATE SKIP LOCKED` to prevent double-dispatch
    /// when multiple worker processes are polling the queue.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs \
             SET status_id = $1, claimed_at = NOW(), updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM jobs \
                 WHERE status_id = $2 AND NOT superseded AND claimed_at IS NULL \
                 ORDER BY submitted_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Running.id())
            .bind(JobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a job as completed.
    pub async fn complete(pool: &PgPool, job_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Completed.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a job as failed with an error message.
    pub async fn fail(pool: &PgPool, job_id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, error_message = $3, completed_at = NOW(), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Failed.id())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a job by its row ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
