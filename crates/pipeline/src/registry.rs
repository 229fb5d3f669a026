//! Postgres-backed [`RunRegistry`].

use async_trait::async_trait;
use sqlx::PgPool;

use basin_core::run::ModelRun;
use basin_db::repositories::run_repo::RunRepo;

use crate::capabilities::RunRegistry;
use crate::StageError;

/// Run-document persistence over the `runs` table.
#[derive(Clone)]
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunRegistry for PgRegistry {
    async fn get(&self, run_id: &str) -> Result<Option<ModelRun>, StageError> {
        RunRepo::find_by_id(&self.pool, run_id)
            .await
            .map_err(|e| StageError::Registry(e.to_string()))
    }

    async fn put(&self, run: &ModelRun) -> Result<(), StageError> {
        RunRepo::update(&self.pool, run)
            .await
            .map_err(|e| StageError::Registry(e.to_string()))
    }
}
