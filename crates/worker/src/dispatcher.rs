//! Background job dispatcher.
//!
//! Polls the queue every `poll_interval` and claims pending jobs with
//! `SELECT ... FOR UPDATE SKIP LOCKED` via [`JobRepo::claim_next`], so
//! concurrent workers never double-dispatch. Each claimed job runs in its
//! own task; a semaphore bounds how many run at once.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use basin_db::models::job::Job;
use basin_db::repositories::job_repo::JobRepo;
use basin_pipeline::{PipelineExecutor, RunJobPayload};

/// Default polling interval for the dispatcher loop.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Claims and executes run jobs until cancelled.
pub struct JobDispatcher {
    pool: PgPool,
    executor: Arc<PipelineExecutor>,
    poll_interval: Duration,
    permits: Arc<Semaphore>,
}

impl JobDispatcher {
    pub fn new(pool: PgPool, executor: Arc<PipelineExecutor>, concurrency: usize) -> Self {
        Self {
            pool,
            executor,
            poll_interval: DEFAULT_POLL_INTERVAL,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the dispatcher loop until the cancellation token is triggered,
    /// then wait for in-flight runs to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        let mut in_flight = JoinSet::new();
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            concurrency = self.permits.available_permits(),
            "job dispatcher started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("job dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.claim_cycle(&mut in_flight).await {
                        tracing::error!(error = %e, "claim cycle failed");
                    }
                }
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "run task panicked");
                    }
                }
            }
        }

        while let Some(result) = in_flight.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "run task panicked during drain");
            }
        }
    }

    /// One cycle: claim pending jobs while both work and permits exist.
    async fn claim_cycle(
        &self,
        in_flight: &mut JoinSet<()>,
    ) -> Result<(), sqlx::Error> {
        loop {
            let Ok(permit) = self.permits.clone().try_acquire_owned() else {
                return Ok(());
            };

            let Some(job) = JobRepo::claim_next(&self.pool).await? else {
                return Ok(());
            };

            tracing::info!(job_id = job.id, job_key = %job.job_key, "job claimed");

            let pool = self.pool.clone();
            let executor = self.executor.clone();
            in_flight.spawn(async move {
                Self::execute_job(&pool, &executor, job).await;
                drop(permit);
            });
        }
    }

    /// Execute one claimed job and settle its row.
    ///
    /// The pipeline absorbs stage failures internally, so a failed outcome
    /// here is a normally-terminated run; only the job row bookkeeping can
    /// still error.
    async fn execute_job(pool: &PgPool, executor: &PipelineExecutor, job: Job) {
        let payload: RunJobPayload = match serde_json::from_value(job.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(job_id = job.id, error = %e, "unreadable job payload");
                if let Err(e) = JobRepo::fail(pool, job.id, &format!("unreadable payload: {e}")).await
                {
                    tracing::error!(job_id = job.id, error = %e, "could not fail job");
                }
                return;
            }
        };

        let outcome = executor.execute(&payload).await;

        let settled = if outcome.succeeded() {
            JobRepo::complete(pool, job.id).await
        } else {
            let message = outcome.error.as_deref().unwrap_or("run failed");
            JobRepo::fail(pool, job.id, message).await
        };
        if let Err(e) = settled {
            tracing::error!(job_id = job.id, error = %e, "could not settle job row");
        }
    }
}
