//! Integration tests for the registry collections and the job queue.
//!
//! Exercises the repository layer against a real database:
//! - model/run document round-trips
//! - idempotent job lookup by key and supersede-on-restart
//! - SKIP LOCKED claiming and terminal transitions

use basin_core::model::{Directive, Model};
use basin_core::run::{ModelRun, RunStatus};
use basin_db::models::job::SubmitJob;
use basin_db::models::status::JobStatus;
use basin_db::repositories::{JobRepo, ModelRepo, RunRepo};
use basin_db::repositories::run_repo::RunSearchQuery;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sample_model(id: &str) -> Model {
    Model {
        id: id.to_string(),
        name: "maxhop".to_string(),
        image: "example/maxhop:0.3".to_string(),
        directive: Directive {
            command: "python run.py".to_string(),
            parameters: vec![],
        },
        configs: vec![],
        outputs: vec![],
        accessories: vec![],
        created_at: None,
    }
}

fn sample_run(id: &str, model_id: &str) -> ModelRun {
    ModelRun {
        id: id.to_string(),
        model_id: model_id.to_string(),
        model_name: "maxhop".to_string(),
        parameters: vec![],
        status: RunStatus::Pending,
        created_at: chrono::Utc::now(),
        data_paths: vec![],
        pre_gen_output_paths: vec![],
        executed_at: None,
    }
}

fn sample_job(key: &str, run_id: &str) -> SubmitJob {
    SubmitJob {
        job_key: key.to_string(),
        run_id: run_id.to_string(),
        model_id: "m1".to_string(),
        payload: serde_json::json!({"run_id": run_id}),
    }
}

// ---------------------------------------------------------------------------
// Registry documents
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn model_document_round_trip(pool: PgPool) {
    let model = sample_model("m1");
    ModelRepo::upsert(&pool, &model).await.unwrap();

    let loaded = ModelRepo::find_by_id(&pool, "m1").await.unwrap().unwrap();
    assert_eq!(loaded.id, "m1");
    assert_eq!(loaded.image, "example/maxhop:0.3");

    assert!(ModelRepo::find_by_id(&pool, "missing").await.unwrap().is_none());
}

#[sqlx::test]
async fn run_upsert_update_and_search(pool: PgPool) {
    let mut run = sample_run("r1", "m1");
    RunRepo::upsert(&pool, &run).await.unwrap();

    run.status = RunStatus::Success;
    run.data_paths = vec!["https://example.com/r1.parquet.gzip".to_string()];
    RunRepo::update(&pool, &run).await.unwrap();

    let loaded = RunRepo::find_by_id(&pool, "r1").await.unwrap().unwrap();
    assert_eq!(loaded.status, RunStatus::Success);
    assert_eq!(loaded.data_paths.len(), 1);

    let by_model = RunRepo::search(
        &pool,
        &RunSearchQuery {
            model_id: Some("m1".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_model.len(), 1);

    let none = RunRepo::search(
        &pool,
        &RunSearchQuery {
            model_id: Some("other".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(none.is_empty());
}

#[sqlx::test]
async fn run_upsert_replaces_an_existing_document(pool: PgPool) {
    let mut run = sample_run("r1", "m1");
    RunRepo::upsert(&pool, &run).await.unwrap();

    run.status = RunStatus::Running;
    RunRepo::upsert(&pool, &run).await.unwrap();

    let loaded = RunRepo::find_by_id(&pool, "r1").await.unwrap().unwrap();
    assert_eq!(loaded.status, RunStatus::Running);
}

// ---------------------------------------------------------------------------
// Job queue
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn submit_and_find_active_by_key(pool: PgPool) {
    let job = JobRepo::submit(&pool, &sample_job("model-xform:m1:r1", "r1"))
        .await
        .unwrap();
    assert_eq!(job.status_id, JobStatus::Pending.id());

    let found = JobRepo::find_active_by_key(&pool, "model-xform:m1:r1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, job.id);
}

#[sqlx::test]
async fn duplicate_active_key_is_rejected(pool: PgPool) {
    JobRepo::submit(&pool, &sample_job("model-xform:m1:r1", "r1"))
        .await
        .unwrap();

    // The partial unique index keeps a second live row out, and the
    // rejection is recognizable so callers can attach instead of erroring.
    let err = JobRepo::submit(&pool, &sample_job("model-xform:m1:r1", "r1"))
        .await
        .unwrap_err();
    assert!(JobRepo::is_duplicate_active_key(&err));
}

#[sqlx::test]
async fn supersede_allows_resubmission(pool: PgPool) {
    let original = JobRepo::submit(&pool, &sample_job("model-xform:m1:r1", "r1"))
        .await
        .unwrap();

    assert!(JobRepo::supersede_by_key(&pool, "model-xform:m1:r1")
        .await
        .unwrap());

    let fresh = JobRepo::submit(&pool, &sample_job("model-xform:m1:r1", "r1"))
        .await
        .unwrap();
    assert_ne!(fresh.id, original.id);

    let active = JobRepo::find_active_by_key(&pool, "model-xform:m1:r1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, fresh.id);
}

#[sqlx::test]
async fn restart_resubmits_an_already_registered_run(pool: PgPool) {
    // The full restart sequence: the run document already exists from the
    // first submission, the live job gets superseded, and the same run id
    // is written again alongside a fresh job row.
    let run = sample_run("r1", "m1");
    RunRepo::upsert(&pool, &run).await.unwrap();
    JobRepo::submit(&pool, &sample_job("model-xform:m1:r1", "r1"))
        .await
        .unwrap();

    assert!(JobRepo::supersede_by_key(&pool, "model-xform:m1:r1")
        .await
        .unwrap());
    RunRepo::upsert(&pool, &run).await.unwrap();
    let fresh = JobRepo::submit(&pool, &sample_job("model-xform:m1:r1", "r1"))
        .await
        .unwrap();

    let active = JobRepo::find_active_by_key(&pool, "model-xform:m1:r1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, fresh.id);
}

#[sqlx::test]
async fn claim_next_takes_oldest_pending_once(pool: PgPool) {
    JobRepo::submit(&pool, &sample_job("k1", "r1")).await.unwrap();
    JobRepo::submit(&pool, &sample_job("k2", "r2")).await.unwrap();

    let first = JobRepo::claim_next(&pool).await.unwrap().unwrap();
    assert_eq!(first.run_id, "r1");
    assert_eq!(first.status_id, JobStatus::Running.id());

    let second = JobRepo::claim_next(&pool).await.unwrap().unwrap();
    assert_eq!(second.run_id, "r2");

    assert!(JobRepo::claim_next(&pool).await.unwrap().is_none());
}

#[sqlx::test]
async fn complete_and_fail_are_terminal(pool: PgPool) {
    JobRepo::submit(&pool, &sample_job("k1", "r1")).await.unwrap();
    JobRepo::submit(&pool, &sample_job("k2", "r2")).await.unwrap();

    let a = JobRepo::claim_next(&pool).await.unwrap().unwrap();
    let b = JobRepo::claim_next(&pool).await.unwrap().unwrap();

    JobRepo::complete(&pool, a.id).await.unwrap();
    JobRepo::fail(&pool, b.id, "model exited with code 2").await.unwrap();

    let a = JobRepo::find_by_id(&pool, a.id).await.unwrap().unwrap();
    let b = JobRepo::find_by_id(&pool, b.id).await.unwrap().unwrap();
    assert_eq!(a.status_id, JobStatus::Completed.id());
    assert_eq!(b.status_id, JobStatus::Failed.id());
    assert_eq!(b.error_message.as_deref(), Some("model exited with code 2"));
    assert!(b.completed_at.is_some());
}
